//! Class registry scanner
//!
//! Locates `ClassDB::classes` without symbols by reading every aligned
//! address of the module's data sections as a hash-table header and
//! scoring how much the structure behind it looks like the class registry.

mod candidate;
mod constants;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::memory::layout::{class_info, hash_map, node};
use crate::memory::{ByteBuffer, MemorySection, ModuleInfo, ReadMemory};
use crate::name::StringNameReader;

pub use candidate::{Candidate, CandidateDetails, select_candidate};
pub use constants::{KNOWN_CLASSES, MIN_CANDIDATE_SCORE};
use constants::*;

/// Whether `name` looks like an engine class name.
///
/// The first character must be uppercase; ignoring underscores and the
/// `2D`/`3D` suffixes, the rest must be alphanumeric.
pub fn is_class_name(name: &str) -> bool {
    if !name.chars().next().is_some_and(char::is_uppercase) {
        return false;
    }
    let stripped = name.replace('_', "").replace("2D", "").replace("3D", "");
    !stripped.is_empty() && stripped.chars().all(char::is_alphanumeric)
}

pub struct RegistryScanner<'a, R: ReadMemory> {
    reader: &'a R,
    module: &'a ModuleInfo,
    names: StringNameReader<'a, R>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, R: ReadMemory> RegistryScanner<'a, R> {
    pub fn new(reader: &'a R, module: &'a ModuleInfo) -> Self {
        Self {
            reader,
            module,
            names: StringNameReader::new(reader, module),
            cancel: None,
        }
    }

    /// Stop scanning with [`Error::ScanCancelled`] once `flag` is set
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Scan the data sections for registry candidates.
    ///
    /// Falls back to the whole module when no section looks like data.
    /// Results are sorted by descending score; ties keep scan order.
    pub fn scan(&self, sections: &[MemorySection]) -> Result<Vec<Candidate>> {
        let mut targets: Vec<MemorySection> =
            sections.iter().filter(|s| s.is_data()).cloned().collect();
        if targets.is_empty() {
            debug!("No data sections, scanning the full module");
            targets.push(MemorySection::new(
                "full",
                self.module.base_address,
                self.module.size,
            ));
        }

        let mut candidates = Vec::new();
        for section in &targets {
            info!(
                "Scanning {} (0x{:X}, {} KB)",
                section.name,
                section.start,
                section.size / 1024
            );
            let before = candidates.len();
            self.scan_range(section.start, section.end(), &mut candidates)?;
            debug!(
                "  {} candidate(s) in {}",
                candidates.len() - before,
                section.name
            );
        }

        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(candidates)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn scan_range(&self, start: u64, end: u64, out: &mut Vec<Candidate>) -> Result<()> {
        let header_size = hash_map::SIZE as u64;
        let last = end.saturating_sub(header_size);
        let mut chunk_start = start;

        while chunk_start < last {
            // Overlap by one header so the last addresses of a chunk can be
            // decoded from the same buffer.
            let chunk_end = chunk_start
                .saturating_add(SCAN_CHUNK_SIZE + header_size)
                .min(end);
            let chunk = self
                .reader
                .read_bytes(chunk_start, (chunk_end - chunk_start) as usize)
                .ok();

            let step_end = chunk_start.saturating_add(SCAN_CHUNK_SIZE).min(last);
            let mut addr = chunk_start;
            while addr < step_end {
                if self.is_cancelled() {
                    info!("Scan cancelled at 0x{:X}", addr);
                    return Err(Error::ScanCancelled);
                }

                let score = match &chunk {
                    Some(bytes) => {
                        let offset = (addr - chunk_start) as usize;
                        self.score_header(&bytes[offset..offset + hash_map::SIZE])
                    }
                    None => self.score_at(addr),
                };

                if let Some((score, details)) = score
                    && score > MIN_CANDIDATE_SCORE
                {
                    debug!(
                        "  Candidate 0x{:X} (+0x{:X}) score={} size={} samples={:?}",
                        addr,
                        self.module.offset_of(addr),
                        score,
                        details.declared_size,
                        details.sample_names
                    );
                    out.push(Candidate {
                        address: addr,
                        offset: self.module.offset_of(addr),
                        score,
                        details,
                    });
                }
                addr += 8;
            }
            chunk_start = step_end;
        }
        Ok(())
    }

    /// Read and score the header at `addr`.
    ///
    /// Returns `None` when the header itself is unreadable.
    pub fn score_at(&self, addr: u64) -> Option<(i32, CandidateDetails)> {
        let header = self.reader.read_bytes(addr, hash_map::SIZE).ok()?;
        self.score_header(&header)
    }

    /// Score an already-fetched 48-byte header.
    ///
    /// Structurally impossible headers score 0.
    pub fn score_header(&self, header: &[u8]) -> Option<(i32, CandidateDetails)> {
        let header = ByteBuffer::new(header);
        let head_ptr = header.u64_at(hash_map::HEAD)?;
        let tail_ptr = header.u64_at(hash_map::TAIL)?;
        let capacity_index = header.u32_at(hash_map::CAPACITY_INDEX)?;
        let size = header.u32_at(hash_map::SIZE_FIELD)?;

        let mut details = CandidateDetails {
            declared_size: size,
            head_ptr,
            ..Default::default()
        };

        if !(MIN_DECLARED_SIZE..=MAX_DECLARED_SIZE).contains(&size)
            || capacity_index == 0
            || capacity_index >= MAX_CAPACITY_INDEX
            || !self.module.is_plausible(head_ptr)
            || !self.module.is_plausible(tail_ptr)
        {
            return Some((0, details));
        }

        let mut score = if TYPICAL_SIZE_RANGE.contains(&size) {
            SCORE_TYPICAL_SIZE
        } else if PLAUSIBLE_SIZE_RANGE.contains(&size) {
            SCORE_PLAUSIBLE_SIZE
        } else {
            SCORE_OTHER_SIZE
        };

        score += self.walk_elements(head_ptr, size, &mut details);

        score += if details.valid_elements >= 15 {
            SCORE_MANY_VALID
        } else if details.valid_elements >= 10 {
            SCORE_SOME_VALID
        } else {
            SCORE_PER_VALID * details.valid_elements as i32
        };

        if details.nested_tables >= 10 {
            score += SCORE_MANY_NESTED;
        } else if details.nested_tables >= 5 {
            score += SCORE_SOME_NESTED;
        }

        details.sample_names.truncate(MAX_SAMPLE_NAMES);
        Some((score, details))
    }

    /// Sample the first elements of the list, returning their score share
    fn walk_elements(&self, head_ptr: u64, size: u32, details: &mut CandidateDetails) -> i32 {
        let mut score = 0;
        let mut current = head_ptr;

        for i in 0..size.min(MAX_SAMPLED_ELEMENTS) {
            if current == 0 {
                break;
            }
            let Ok(element) = self.reader.read_bytes(current, node::SIZE) else {
                break;
            };
            let element = ByteBuffer::new(&element);
            let (Some(next), Some(prev), Some(key)) = (
                element.u64_at(node::NEXT),
                element.u64_at(node::PREV),
                element.u64_at(node::KEY),
            ) else {
                break;
            };

            if i == 0 && prev != 0 {
                score -= PENALTY_HEAD_HAS_PREV;
            }

            if let Some(name) = self.names.read(key)
                && is_class_name(&name)
            {
                details.valid_elements += 1;
                if KNOWN_CLASSES.contains(&name.as_str()) {
                    score += SCORE_KNOWN_CLASS;
                }
                score += self.probe_class_info(current, &name, details);
                details.sample_names.push(name);
            }

            current = next;
        }

        score
    }

    /// Cross-check the `ClassInfo` embedded after the element's key
    fn probe_class_info(&self, element: u64, name: &str, details: &mut CandidateDetails) -> i32 {
        let Ok(info) = self
            .reader
            .read_bytes(element + class_info::FROM_NODE, class_info::PROBE_SIZE)
        else {
            return 0;
        };
        let info = ByteBuffer::new(&info);
        let mut score = 0;

        let methods = class_info::METHOD_MAP;
        if let (Some(head), Some(size)) = (
            info.u64_at(methods + hash_map::HEAD),
            info.u32_at(methods + hash_map::SIZE_FIELD),
        ) && self.module.is_plausible(head)
            && size > 0
            && size < MAX_NESTED_SIZE
        {
            details.nested_tables += 1;
            score += SCORE_NESTED_TABLE;
        }

        if let Some(name_ptr) = info.u64_at(class_info::NAME)
            && self.names.read(name_ptr).as_deref() == Some(name)
        {
            score += SCORE_NAME_MATCH;
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BASE, ImageBuilder, MODULE_MAPPED, TestClass, TestMethod};

    const HEADER: u64 = BASE + 0x2000;

    fn class_with_method(name: &'static str) -> TestClass {
        let mut class = TestClass::new(name, Some("Object"));
        class.methods.push(TestMethod::new("get_class", 1));
        class
    }

    fn twenty_classes() -> Vec<TestClass> {
        let names = [
            "Object",
            "RefCounted",
            "Resource",
            "Node",
            "Node2D",
            "Node3D",
            "Control",
            "Sprite2D",
            "Camera2D",
            "Camera3D",
            "AudioStreamPlayer",
            "Timer",
            "Label",
            "Button",
            "Area2D",
            "CollisionShape3D",
            "Tween",
            "Viewport",
            "Texture2D",
            "PhysicsBody2D",
        ];
        names.into_iter().map(class_with_method).collect()
    }

    #[test]
    fn test_is_class_name() {
        assert!(is_class_name("Node2D"));
        assert!(is_class_name("AudioStreamPlayer3D"));
        assert!(is_class_name("GDScript_Native"));
        assert!(!is_class_name("node"));
        assert!(!is_class_name("_Internal"));
        assert!(!is_class_name("Bad Name"));
        assert!(!is_class_name("Has-Dash"));
        assert!(!is_class_name(""));
    }

    #[test]
    fn test_header_with_no_valid_elements_scores_size_only() {
        let mut image = ImageBuilder::new();
        // Head and tail are plausible but point at unmapped memory
        image.header(HEADER, 0x3000_0000, 0x3000_1000, 10, 900);
        let reader = image.build();
        let module = ImageBuilder::module();
        let scanner = RegistryScanner::new(&reader, &module);

        let (score, details) = scanner.score_at(HEADER).unwrap();
        assert_eq!(score, 100);
        assert_eq!(details.declared_size, 900);
        assert_eq!(details.valid_elements, 0);
        assert!(details.sample_names.is_empty());
    }

    #[test]
    fn test_well_formed_registry_scores_higher() {
        let mut image = ImageBuilder::new();
        image.registry(HEADER, &twenty_classes());
        // Declare a typical registry size; only 20 elements are sampled
        image.put_u32(HEADER + hash_map::SIZE_FIELD as u64, 900);
        let reader = image.build();
        let module = ImageBuilder::module();
        let scanner = RegistryScanner::new(&reader, &module);

        let (score, details) = scanner.score_at(HEADER).unwrap();
        assert_eq!(details.valid_elements, 20);
        assert_eq!(details.nested_tables, 20);
        assert_eq!(
            details.sample_names,
            vec!["Object", "RefCounted", "Resource", "Node", "Node2D"]
        );
        // size 100, 11 known classes, 20 × (nested 5 + name 10),
        // many valid 100, many nested 80
        assert_eq!(score, 100 + 11 * 50 + 20 * 15 + 100 + 80);
        assert!(score > 100);
    }

    /// Twelve classes outside the well-known set, the first `with_methods`
    /// of them carrying a method table
    fn twelve_unknown_classes(with_methods: usize) -> Vec<TestClass> {
        let names = [
            "Timer",
            "Label",
            "Button",
            "Area2D",
            "Tween",
            "Viewport",
            "Texture2D",
            "PhysicsBody2D",
            "Light2D",
            "Skeleton3D",
            "Curve",
            "Font",
        ];
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                if i < with_methods {
                    class_with_method(name)
                } else {
                    TestClass::new(name, Some("Object"))
                }
            })
            .collect()
    }

    fn score_registry(classes: &[TestClass], declared_size: u32) -> (i32, CandidateDetails) {
        let mut image = ImageBuilder::new();
        image.registry(HEADER, classes);
        image.put_u32(HEADER + hash_map::SIZE_FIELD as u64, declared_size);
        let reader = image.build();
        let module = ImageBuilder::module();
        RegistryScanner::new(&reader, &module)
            .score_at(HEADER)
            .unwrap()
    }

    #[test]
    fn test_mid_size_band_and_tiers() {
        let (score, details) = score_registry(&twelve_unknown_classes(7), 250);
        assert_eq!(details.valid_elements, 12);
        assert_eq!(details.nested_tables, 7);
        // size 50, 7 nested × 5, 12 name matches × 10,
        // some valid 50, some nested 40
        assert_eq!(score, 50 + 35 + 120 + 50 + 40);
    }

    #[test]
    fn test_small_size_band_scores_per_element() {
        let classes: Vec<_> = twelve_unknown_classes(0).into_iter().take(3).collect();
        let (score, details) = score_registry(&classes, 50);
        assert_eq!(details.valid_elements, 3);
        assert_eq!(details.nested_tables, 0);
        // size 10, 3 valid × 3, 3 name matches × 10
        assert_eq!(score, 10 + 9 + 30);
    }

    #[test]
    fn test_size_bands() {
        let classes = twelve_unknown_classes(0);
        let base = 120 + 50;
        assert_eq!(score_registry(&classes, 500).0, 100 + base);
        assert_eq!(score_registry(&classes, 2000).0, 100 + base);
        assert_eq!(score_registry(&classes, 200).0, 50 + base);
        assert_eq!(score_registry(&classes, 3000).0, 50 + base);
        assert_eq!(score_registry(&classes, 199).0, 10 + base);
        assert_eq!(score_registry(&classes, 3001).0, 10 + base);
    }

    #[test]
    fn test_embedded_name_mismatch_loses_bonus() {
        let classes = twelve_unknown_classes(0);
        let (baseline, _) = score_registry(&classes, 250);

        let mut image = ImageBuilder::new();
        let nodes = image.registry(HEADER, &classes);
        image.put_u32(HEADER + hash_map::SIZE_FIELD as u64, 250);
        let other = image.string_name("Button");
        image.put_u64(nodes[0] + class_info::FROM_NODE + class_info::NAME as u64, other);
        let reader = image.build();
        let module = ImageBuilder::module();
        let (score, details) = RegistryScanner::new(&reader, &module)
            .score_at(HEADER)
            .unwrap();

        assert_eq!(details.valid_elements, 12);
        assert_eq!(score, baseline - 10);
    }

    #[test]
    fn test_structural_rejections() {
        let module = ImageBuilder::module();
        let cases = [
            (0x3000_0000u64, 0x3000_0000u64, 10u32, 9u32),
            (0x3000_0000, 0x3000_0000, 10, 10_001),
            (0x3000_0000, 0x3000_0000, 0, 900),
            (0x3000_0000, 0x3000_0000, 30, 900),
            (0x100, 0x3000_0000, 10, 900),
            (0x3000_0000, 0, 10, 900),
        ];
        for (head, tail, capacity, size) in cases {
            let mut image = ImageBuilder::new();
            image.header(HEADER, head, tail, capacity, size);
            let reader = image.build();
            let scanner = RegistryScanner::new(&reader, &module);
            let (score, _) = scanner.score_at(HEADER).unwrap();
            assert_eq!(score, 0, "head={head:#x} cap={capacity} size={size}");
        }
    }

    #[test]
    fn test_head_with_predecessor_is_penalized() {
        let mut image = ImageBuilder::new();
        let nodes = image.registry(HEADER, &twenty_classes());
        image.put_u32(HEADER + hash_map::SIZE_FIELD as u64, 900);
        let reader = image.build();
        let module = ImageBuilder::module();
        let baseline = RegistryScanner::new(&reader, &module)
            .score_at(HEADER)
            .unwrap()
            .0;

        let mut image = ImageBuilder::new();
        let nodes_again = image.registry(HEADER, &twenty_classes());
        assert_eq!(nodes, nodes_again);
        image.put_u32(HEADER + hash_map::SIZE_FIELD as u64, 900);
        image.put_u64(nodes[0] + node::PREV as u64, nodes[1]);
        let reader = image.build();
        let score = RegistryScanner::new(&reader, &module)
            .score_at(HEADER)
            .unwrap()
            .0;

        assert_eq!(score, baseline - 20);
    }

    #[test]
    fn test_scan_finds_registry_in_data_section() {
        let mut image = ImageBuilder::new();
        image.registry(HEADER, &twenty_classes());
        image.put_u32(HEADER + hash_map::SIZE_FIELD as u64, 900);
        let reader = image.build();
        let module = ImageBuilder::module();
        let sections = vec![
            MemorySection::new(".text", BASE + 0x1000, 0x1000),
            MemorySection::new(".data", BASE + 0x2000, (MODULE_MAPPED - 0x2000) as u64),
        ];

        let candidates = RegistryScanner::new(&reader, &module)
            .scan(&sections)
            .unwrap();

        assert!(!candidates.is_empty());
        let best = &candidates[0];
        assert_eq!(best.address, HEADER);
        assert_eq!(best.offset, 0x2000);
        assert!(best.has_sample("Object"));
        assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(select_candidate(&candidates).unwrap().address, HEADER);
    }

    #[test]
    fn test_scan_falls_back_to_full_module() {
        let mut image = ImageBuilder::new();
        image.registry(HEADER, &twenty_classes());
        image.put_u32(HEADER + hash_map::SIZE_FIELD as u64, 900);
        let reader = image.build();
        let module = ImageBuilder::module();
        let scanner = RegistryScanner::new(&reader, &module);

        let code_only = vec![MemorySection::new(".text", BASE + 0x1000, 0x1000)];
        for sections in [code_only, Vec::new()] {
            let candidates = scanner.scan(&sections).unwrap();
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].address, HEADER);
        }
    }

    #[test]
    fn test_equal_scores_keep_scan_order() {
        let first = HEADER;
        let best = HEADER + 0x100;
        let last = HEADER + 0x200;
        let mut image = ImageBuilder::new();
        image.registry(first, &twenty_classes());
        image.registry(best, &twenty_classes());
        image.registry(last, &twenty_classes());
        image.put_u32(best + hash_map::SIZE_FIELD as u64, 900);
        let reader = image.build();
        let module = ImageBuilder::module();
        let sections = vec![MemorySection::new(
            ".data",
            BASE + 0x2000,
            (MODULE_MAPPED - 0x2000) as u64,
        )];

        let candidates = RegistryScanner::new(&reader, &module)
            .scan(&sections)
            .unwrap();

        let order: Vec<u64> = candidates.iter().map(|c| c.address).collect();
        assert_eq!(order, vec![best, first, last]);
        assert_eq!(candidates[1].score, candidates[2].score);
    }

    #[test]
    fn test_scan_survives_unreadable_sections() {
        let image = ImageBuilder::new();
        let reader = image.build();
        let module = ImageBuilder::module();
        // Entirely outside the mapped image
        let sections = vec![MemorySection::new(".data", BASE + 0x8_0000, 0x200)];

        let candidates = RegistryScanner::new(&reader, &module)
            .scan(&sections)
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_scan_cancelled() {
        let image = ImageBuilder::new();
        let reader = image.build();
        let module = ImageBuilder::module();
        let cancel = AtomicBool::new(true);
        let sections = vec![MemorySection::new(".data", BASE, 0x1000)];

        let result = RegistryScanner::new(&reader, &module)
            .with_cancel(&cancel)
            .scan(&sections);
        assert!(matches!(result, Err(Error::ScanCancelled)));
    }
}
