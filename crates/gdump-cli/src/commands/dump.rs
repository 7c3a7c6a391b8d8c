//! Dump command implementation.

use anyhow::Result;
use gdump::{Dumper, DumperConfig, MemoryReader};
use owo_colors::OwoColorize;
use tracing::info;

use super::offset::parse_hex_address;
use super::open_process;
use crate::shutdown::CancelSignal;

const TOP_CLASSES: usize = 10;

pub fn run(config: &DumperConfig, pid: Option<u32>, address: Option<&str>) -> Result<()> {
    let process = open_process(config, pid)?;
    let mut dumper = Dumper::new(MemoryReader::new(&process), process.module.clone());

    let address = match address {
        Some(address) => parse_hex_address(address)?,
        None => {
            let cancel = CancelSignal::with_ctrlc()?;
            dumper.locate(Some(cancel.as_atomic()))?.address
        }
    };
    info!("Decoding registry at 0x{:X}", address);

    dumper.dump(address);
    dumper.save_json(&config.output_path)?;

    let stats = dumper.stats();
    println!();
    println!(
        "Registry: 0x{:X} (+0x{:X})",
        address,
        dumper.module().offset_of(address)
    );
    println!("Classes:    {}", stats.class_count.green());
    println!("Methods:    {}", stats.method_count);
    println!("Properties: {}", stats.property_count);
    println!();

    println!("Top {} classes by method count:", TOP_CLASSES);
    for class in dumper.top_classes(TOP_CLASSES) {
        println!(
            "  {:<32} {:>4} methods  {:>4} properties  size {}",
            class.name,
            class.methods.len(),
            class.properties.len(),
            class.size.unwrap_or_default()
        );
    }
    println!();
    println!("Saved to {}", config.output_path.display());
    Ok(())
}
