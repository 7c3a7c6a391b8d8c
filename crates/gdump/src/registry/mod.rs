//! ClassDB registry decoding
//!
//! Walks the registry's element list and, for each class, its nested
//! method and property tables. Every walk is step-bounded and any failed
//! read ends that walk early without failing the decode.

mod records;

use tracing::{debug, info, warn};

use crate::memory::layout::{class_info, hash_map, method_bind, node, property_node, walk};
use crate::memory::{ByteBuffer, ModuleInfo, ReadMemory};
use crate::name::StringNameReader;
use crate::variant::VariantType;

pub use records::{ClassMap, ClassRecord, MethodRecord, PropertyRecord};

/// Step limit for a walk over a table declaring `size` elements
fn walk_bound(table: &str, size: u32, slack: u64) -> u64 {
    if size > walk::SUSPICIOUS_SIZE {
        warn!("{} table declares {} elements, walk may be slow", table, size);
    }
    size as u64 + slack
}

pub struct RegistryDecoder<'a, R: ReadMemory> {
    reader: &'a R,
    module: &'a ModuleInfo,
    names: StringNameReader<'a, R>,
}

impl<'a, R: ReadMemory> RegistryDecoder<'a, R> {
    pub fn new(reader: &'a R, module: &'a ModuleInfo) -> Self {
        Self {
            reader,
            module,
            names: StringNameReader::new(reader, module),
        }
    }

    /// Decode every class reachable from the registry header at `address`.
    ///
    /// Classes without a recoverable name are skipped. A duplicate name
    /// replaces the earlier record.
    pub fn decode(&self, address: u64) -> ClassMap {
        let mut classes = ClassMap::new();

        let Ok(header) = self.reader.read_bytes(address, hash_map::SIZE) else {
            debug!("Registry header unreadable at 0x{:X}", address);
            return classes;
        };
        let header = ByteBuffer::new(&header);
        let (Some(head), Some(size)) = (
            header.u64_at(hash_map::HEAD),
            header.u32_at(hash_map::SIZE_FIELD),
        ) else {
            return classes;
        };

        let max_steps = walk_bound("Registry", size, walk::REGISTRY_SLACK);
        let mut skipped = 0usize;
        let mut current = head;
        let mut steps = 0u64;

        while current != 0 && steps < max_steps {
            let Some(next) = self.read_next(current, node::SIZE) else {
                break;
            };

            match self.decode_class(current) {
                Some(class) => {
                    if classes.contains_key(&class.name) {
                        debug!("Duplicate class {}, keeping the later entry", class.name);
                    }
                    classes.insert(class.name.clone(), class);
                }
                None => skipped += 1,
            }

            current = next;
            steps += 1;
        }

        info!(
            "Decoded {} classes from 0x{:X} ({} declared, {} skipped)",
            classes.len(),
            address,
            size,
            skipped
        );
        classes
    }

    fn read_next(&self, node_addr: u64, node_size: usize) -> Option<u64> {
        let bytes = self.reader.read_bytes(node_addr, node_size).ok()?;
        ByteBuffer::new(&bytes).u64_at(node::NEXT)
    }

    /// Decode the `ClassInfo` embedded in the registry node at `node_addr`
    pub fn decode_class(&self, node_addr: u64) -> Option<ClassRecord> {
        let info = self
            .reader
            .read_bytes(node_addr + class_info::FROM_NODE, class_info::READ_SIZE)
            .ok()?;
        let info = ByteBuffer::new(&info);

        let name = self.names.read(info.u64_at(class_info::NAME)?)?;
        let parent = info
            .u64_at(class_info::INHERITS)
            .and_then(|ptr| self.names.read(ptr));

        let mut class = ClassRecord::new(name, parent);
        if let Some(methods) = info.slice_from(class_info::METHOD_MAP) {
            class.methods = self.decode_methods(methods);
        }
        if let Some(properties) = info.slice_from(class_info::PROPERTY_MAP) {
            class.properties = self.decode_properties(properties);
        }
        Some(class)
    }

    /// Walk a method table whose header starts at `table`
    fn decode_methods(&self, table: ByteBuffer<'_>) -> Vec<MethodRecord> {
        let mut methods = Vec::new();
        let (Some(head), Some(size)) = (
            table.u64_at(hash_map::HEAD),
            table.u32_at(hash_map::SIZE_FIELD),
        ) else {
            return methods;
        };

        let max_steps = walk_bound("Method", size, walk::NESTED_SLACK);
        let mut current = head;
        let mut steps = 0u64;

        while current != 0 && steps < max_steps {
            let Ok(element) = self.reader.read_bytes(current, node::SIZE) else {
                break;
            };
            let element = ByteBuffer::new(&element);
            let (Some(next), Some(value)) =
                (element.u64_at(node::NEXT), element.u64_at(node::VALUE))
            else {
                break;
            };

            if self.module.is_plausible(value)
                && let Some(method) = self.decode_method(value)
            {
                methods.push(method);
            }

            current = next;
            steps += 1;
        }
        methods
    }

    /// Decode the `MethodBind` at `address`
    pub fn decode_method(&self, address: u64) -> Option<MethodRecord> {
        let data = self.reader.read_bytes(address, method_bind::SIZE).ok()?;
        let data = ByteBuffer::new(&data);

        let method_id = data.i32_at(method_bind::METHOD_ID)?;
        let name_ptr = data.u64_at(method_bind::NAME)?;
        let default_arg_count = data.i32_at(method_bind::DEFAULT_ARG_COUNT)?;
        let arg_count = data.i32_at(method_bind::ARG_COUNT)?;
        let flags = data.u32_at(method_bind::FLAGS)?;
        let arg_types_ptr = data.u64_at(method_bind::ARG_TYPES)?;

        let name = self.names.read(name_ptr)?;

        let (return_type, arg_types) = self
            .read_arg_types(arg_types_ptr, arg_count)
            .unwrap_or((VariantType::Nil as i32, Vec::new()));

        Some(MethodRecord {
            name,
            method_id,
            arg_count,
            default_arg_count,
            is_static: flags & method_bind::FLAG_STATIC != 0,
            is_const: flags & method_bind::FLAG_CONST != 0,
            has_return: flags & method_bind::FLAG_RETURN != 0,
            return_type,
            arg_types,
        })
    }

    /// Read `[return, arg0, arg1, ...]` type tags
    fn read_arg_types(&self, ptr: u64, arg_count: i32) -> Option<(i32, Vec<i32>)> {
        if !self.module.is_plausible(ptr) || !(0..method_bind::MAX_ARG_COUNT).contains(&arg_count)
        {
            return None;
        }
        let count = arg_count as usize + 1;
        let data = self.reader.read_bytes(ptr, count * 4).ok()?;
        let data = ByteBuffer::new(&data);

        let return_type = data.i32_at(0)?;
        let arg_types = (1..count)
            .map(|i| data.i32_at(i * 4))
            .collect::<Option<Vec<_>>>()?;
        Some((return_type, arg_types))
    }

    /// Walk a property table whose header starts at `table`
    fn decode_properties(&self, table: ByteBuffer<'_>) -> Vec<PropertyRecord> {
        let mut properties = Vec::new();
        let (Some(head), Some(size)) = (
            table.u64_at(hash_map::HEAD),
            table.u32_at(hash_map::SIZE_FIELD),
        ) else {
            return properties;
        };

        let max_steps = walk_bound("Property", size, walk::NESTED_SLACK);
        let mut current = head;
        let mut steps = 0u64;

        while current != 0 && steps < max_steps {
            let Ok(element) = self.reader.read_bytes(current, property_node::SIZE) else {
                break;
            };
            let element = ByteBuffer::new(&element);
            let (Some(next), Some(key), Some(variant_type)) = (
                element.u64_at(property_node::NEXT),
                element.u64_at(property_node::KEY),
                element.i32_at(property_node::VARIANT_TYPE),
            ) else {
                break;
            };

            if let Some(name) = self.names.read(key) {
                properties.push(PropertyRecord::new(name, variant_type));
            }

            current = next;
            steps += 1;
        }
        properties
    }
}
