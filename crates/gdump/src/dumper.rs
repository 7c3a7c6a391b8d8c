//! Scan-and-decode session over one module.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::export;
use crate::layout::compute_layouts;
use crate::memory::{MemorySection, ModuleInfo, ReadMemory, read_pe_sections};
use crate::registry::{ClassMap, ClassRecord, RegistryDecoder};
use crate::scan::{Candidate, RegistryScanner, select_candidate};

/// Totals over a decoded class map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DumpStats {
    pub class_count: usize,
    pub method_count: usize,
    pub property_count: usize,
}

impl DumpStats {
    pub fn from_classes(classes: &ClassMap) -> Self {
        Self {
            class_count: classes.len(),
            method_count: classes.values().map(|c| c.methods.len()).sum(),
            property_count: classes.values().map(|c| c.properties.len()).sum(),
        }
    }
}

/// Bundles a reader with the module and sections it scans
pub struct Dumper<R: ReadMemory> {
    reader: R,
    module: ModuleInfo,
    sections: Vec<MemorySection>,
    classes: ClassMap,
}

impl<R: ReadMemory> Dumper<R> {
    /// Create a session, reading the section table from the module image
    pub fn new(reader: R, module: ModuleInfo) -> Self {
        let sections = read_pe_sections(&reader, module.base_address);
        if sections.is_empty() {
            warn!("No PE sections found for {}", module.name);
        }
        Self::with_sections(reader, module, sections)
    }

    pub fn with_sections(reader: R, module: ModuleInfo, sections: Vec<MemorySection>) -> Self {
        Self {
            reader,
            module,
            sections,
            classes: ClassMap::new(),
        }
    }

    pub fn module(&self) -> &ModuleInfo {
        &self.module
    }

    pub fn sections(&self) -> &[MemorySection] {
        &self.sections
    }

    /// Rank registry candidates across the data sections
    pub fn scan(&self, cancel: Option<&AtomicBool>) -> Result<Vec<Candidate>> {
        let mut scanner = RegistryScanner::new(&self.reader, &self.module);
        if let Some(flag) = cancel {
            scanner = scanner.with_cancel(flag);
        }
        scanner.scan(&self.sections)
    }

    /// Choose the registry among `candidates`
    pub fn select(candidates: &[Candidate]) -> Result<&Candidate> {
        select_candidate(candidates).ok_or(Error::RegistryNotFound)
    }

    /// Scan and select in one step
    pub fn locate(&self, cancel: Option<&AtomicBool>) -> Result<Candidate> {
        let candidates = self.scan(cancel)?;
        let selected = Self::select(&candidates)?;
        info!(
            "Selected registry at 0x{:X} (+0x{:X}, score {})",
            selected.address, selected.offset, selected.score
        );
        Ok(selected.clone())
    }

    /// Decode the registry at `address` and compute layouts
    pub fn dump(&mut self, address: u64) -> &ClassMap {
        let mut classes = RegistryDecoder::new(&self.reader, &self.module).decode(address);
        compute_layouts(&mut classes);
        self.classes = classes;
        &self.classes
    }

    pub fn classes(&self) -> &ClassMap {
        &self.classes
    }

    pub fn stats(&self) -> DumpStats {
        DumpStats::from_classes(&self.classes)
    }

    /// The `n` classes with the most methods, largest first
    pub fn top_classes(&self, n: usize) -> Vec<&ClassRecord> {
        let mut classes: Vec<&ClassRecord> = self.classes.values().collect();
        classes.sort_by(|a, b| b.methods.len().cmp(&a.methods.len()));
        classes.truncate(n);
        classes
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        export::save_json(path, &self.classes)
    }
}
