use anyhow::Result;
use gdump::{DumperConfig, find_engine_processes};

pub fn run(config: &DumperConfig) -> Result<()> {
    let processes = find_engine_processes(&config.window_class)?;
    if processes.is_empty() {
        println!("No windows with class '{}' found", config.window_class);
        return Ok(());
    }

    println!("{:>5}  {:>8}  Title", "Index", "PID");
    for (i, process) in processes.iter().enumerate() {
        let marker = if i == config.process_index { "*" } else { " " };
        println!("{}{:>4}  {:>8}  {}", marker, i, process.pid, process.title);
    }
    Ok(())
}
