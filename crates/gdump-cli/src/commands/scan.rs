//! Scan command implementation.
//!
//! Ranks every registry candidate without decoding, which is useful when
//! the automatic selection picks the wrong table.

use anyhow::Result;
use gdump::{Candidate, Dumper, DumperConfig, MemoryReader, select_candidate};
use owo_colors::OwoColorize;

use super::open_process;
use crate::shutdown::CancelSignal;

pub fn run(config: &DumperConfig, pid: Option<u32>, top: usize) -> Result<()> {
    let process = open_process(config, pid)?;
    let dumper = Dumper::new(MemoryReader::new(&process), process.module.clone());

    for section in dumper.sections() {
        println!(
            "  {:<8} 0x{:X} - 0x{:X}{}",
            section.name,
            section.start,
            section.end(),
            if section.is_data() { " (scanned)" } else { "" }
        );
    }

    let cancel = CancelSignal::with_ctrlc()?;
    let candidates = dumper.scan(Some(cancel.as_atomic()))?;

    if candidates.is_empty() {
        println!("{}", "No registry candidates found".red());
        return Ok(());
    }

    println!();
    println!("{} candidate(s):", candidates.len());
    for candidate in candidates.iter().take(top) {
        print_candidate(candidate);
    }
    if let Some(selected) = select_candidate(&candidates) {
        println!();
        println!(
            "Selected: {} (+0x{:X})",
            format!("0x{:X}", selected.address).green(),
            selected.offset
        );
    }
    Ok(())
}

fn print_candidate(candidate: &Candidate) {
    let score = format!("{:>5}", candidate.score);
    let score = if candidate.has_sample("Object") {
        score.green().to_string()
    } else {
        score.yellow().to_string()
    };
    println!(
        "  0x{:X} (+0x{:X}) score={} size={} valid={} nested={}",
        candidate.address,
        candidate.offset,
        score,
        candidate.details.declared_size,
        candidate.details.valid_elements,
        candidate.details.nested_tables,
    );
    if !candidate.details.sample_names.is_empty() {
        println!(
            "      {}",
            candidate.details.sample_names.join(", ").dimmed()
        );
    }
}
