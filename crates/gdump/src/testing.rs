//! Synthetic registry images shared by the scanner and decoder tests.

use crate::memory::layout::{class_info, hash_map, method_bind, node, property_node, string_name};
use crate::memory::{MockMemoryBuilder, MockMemoryReader, ModuleInfo};

pub const BASE: u64 = 0x1_4000_0000;
pub const MODULE_SIZE: u64 = 0x10_0000;
/// Mapped part of the module image
pub const MODULE_MAPPED: usize = 0x4000;
pub const HEAP: u64 = 0x2000_0000;
const HEAP_SIZE: usize = 0x40_0000;

/// Node size for a registry element: link fields plus the embedded `ClassInfo`
const REGISTRY_NODE_SIZE: usize = class_info::FROM_NODE as usize + class_info::READ_SIZE;

pub struct TestMethod {
    pub name: &'static str,
    pub method_id: i32,
    pub flags: u32,
    pub default_arg_count: i32,
    /// Return type followed by argument types
    pub types: Vec<i32>,
}

impl TestMethod {
    pub fn new(name: &'static str, method_id: i32) -> Self {
        Self {
            name,
            method_id,
            flags: 0,
            default_arg_count: 0,
            types: vec![0],
        }
    }
}

pub struct TestClass {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub methods: Vec<TestMethod>,
    pub properties: Vec<(&'static str, i32)>,
}

impl TestClass {
    pub fn new(name: &'static str, parent: Option<&'static str>) -> Self {
        Self {
            name,
            parent,
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }
}

pub struct ImageBuilder {
    mem: MockMemoryBuilder,
    next: u64,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            mem: MockMemoryBuilder::new()
                .map(BASE, MODULE_MAPPED)
                .map(HEAP, HEAP_SIZE),
            next: HEAP + 0x100,
        }
    }

    pub fn module() -> ModuleInfo {
        ModuleInfo::new("game.exe", BASE, MODULE_SIZE)
    }

    pub fn alloc(&mut self, size: usize) -> u64 {
        let addr = self.next;
        self.next = (self.next + size as u64 + 15) & !15;
        addr
    }

    pub fn put_u64(&mut self, addr: u64, value: u64) {
        self.mem = std::mem::take(&mut self.mem).write_u64(addr, value);
    }

    pub fn put_u32(&mut self, addr: u64, value: u32) {
        self.mem = std::mem::take(&mut self.mem).write_u32(addr, value);
    }

    pub fn put_i32(&mut self, addr: u64, value: i32) {
        self.mem = std::mem::take(&mut self.mem).write_i32(addr, value);
    }

    /// Allocate a name structure with a narrow string
    pub fn string_name(&mut self, text: &str) -> u64 {
        let sn = self.alloc(string_name::SIZE);
        let chars = self.alloc(text.len() + 1);
        self.mem = std::mem::take(&mut self.mem).write_cstr(chars, text);
        self.put_u64(sn + string_name::CNAME as u64, chars);
        sn
    }

    /// Write a hash-table header at `addr`
    pub fn header(&mut self, addr: u64, head: u64, tail: u64, capacity_index: u32, size: u32) {
        self.put_u64(addr + hash_map::HEAD as u64, head);
        self.put_u64(addr + hash_map::TAIL as u64, tail);
        self.put_u32(addr + hash_map::CAPACITY_INDEX as u64, capacity_index);
        self.put_u32(addr + hash_map::SIZE_FIELD as u64, size);
    }

    fn method_bind(&mut self, method: &TestMethod) -> u64 {
        let mb = self.alloc(method_bind::SIZE);
        let name = self.string_name(method.name);
        let arg_count = method.types.len() as i32 - 1;
        self.put_i32(mb + method_bind::METHOD_ID as u64, method.method_id);
        self.put_u64(mb + method_bind::NAME as u64, name);
        self.put_i32(mb + method_bind::DEFAULT_ARG_COUNT as u64, method.default_arg_count);
        self.put_i32(mb + method_bind::ARG_COUNT as u64, arg_count);
        self.put_u32(mb + method_bind::FLAGS as u64, method.flags);

        let types = self.alloc(method.types.len() * 4);
        for (i, tag) in method.types.iter().enumerate() {
            self.put_i32(types + i as u64 * 4, *tag);
        }
        self.put_u64(mb + method_bind::ARG_TYPES as u64, types);
        mb
    }

    /// Write the nested method map of a `ClassInfo` at `info`
    fn method_map(&mut self, info: u64, methods: &[TestMethod]) {
        let nodes: Vec<u64> = methods.iter().map(|_| self.alloc(node::SIZE)).collect();
        for (i, method) in methods.iter().enumerate() {
            let mb = self.method_bind(method);
            let next = nodes.get(i + 1).copied().unwrap_or(0);
            self.put_u64(nodes[i] + node::NEXT as u64, next);
            self.put_u64(nodes[i] + node::VALUE as u64, mb);
        }
        let header = info + class_info::METHOD_MAP as u64;
        let head = nodes.first().copied().unwrap_or(0);
        let tail = nodes.last().copied().unwrap_or(0);
        self.header(header, head, tail, 2, methods.len() as u32);
    }

    fn property_map(&mut self, info: u64, properties: &[(&str, i32)]) {
        let nodes: Vec<u64> = properties
            .iter()
            .map(|_| self.alloc(property_node::SIZE))
            .collect();
        for (i, (name, tag)) in properties.iter().enumerate() {
            let key = self.string_name(name);
            let next = nodes.get(i + 1).copied().unwrap_or(0);
            self.put_u64(nodes[i] + property_node::NEXT as u64, next);
            self.put_u64(nodes[i] + property_node::KEY as u64, key);
            self.put_i32(nodes[i] + property_node::VARIANT_TYPE as u64, *tag);
        }
        let header = info + class_info::PROPERTY_MAP as u64;
        let head = nodes.first().copied().unwrap_or(0);
        let tail = nodes.last().copied().unwrap_or(0);
        self.header(header, head, tail, 2, properties.len() as u32);
    }

    /// Lay out a full registry whose header lives at `header_addr`.
    ///
    /// Returns the node addresses in list order.
    pub fn registry(&mut self, header_addr: u64, classes: &[TestClass]) -> Vec<u64> {
        let nodes: Vec<u64> = classes
            .iter()
            .map(|_| self.alloc(REGISTRY_NODE_SIZE))
            .collect();

        for (i, class) in classes.iter().enumerate() {
            let addr = nodes[i];
            let next = nodes.get(i + 1).copied().unwrap_or(0);
            let prev = if i == 0 { 0 } else { nodes[i - 1] };
            let key = self.string_name(class.name);
            self.put_u64(addr + node::NEXT as u64, next);
            self.put_u64(addr + node::PREV as u64, prev);
            self.put_u64(addr + node::KEY as u64, key);

            let info = addr + class_info::FROM_NODE;
            self.put_u64(info + class_info::NAME as u64, key);
            if let Some(parent) = class.parent {
                let parent_name = self.string_name(parent);
                self.put_u64(info + class_info::INHERITS as u64, parent_name);
            }
            self.method_map(info, &class.methods);
            self.property_map(info, &class.properties);
        }

        let head = nodes.first().copied().unwrap_or(0);
        let tail = nodes.last().copied().unwrap_or(0);
        self.header(header_addr, head, tail, 10, classes.len() as u32);
        nodes
    }

    /// Reader over the image as written so far
    pub fn snapshot(&self) -> MockMemoryReader {
        self.mem.clone().build()
    }

    pub fn build(self) -> MockMemoryReader {
        self.mem.build()
    }
}
