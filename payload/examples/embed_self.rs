//! Prints the resources embedded in this example's own executable.
//!
//! Build it, append a payload with `genpayload pack --append <exe> <dir>`,
//! then run the executable again to see its resources.

use payload::{ignore_missing, load_self};

fn main() -> payload::Result<()> {
    let resources = ignore_missing(load_self())?;

    if resources.is_empty() {
        println!("No resources embedded in this executable");
        return Ok(());
    }

    println!("=== Embedded resources ===\n");
    for (name, data) in resources.iter() {
        println!("{:>10} bytes  {}", data.len(), String::from_utf8_lossy(name));
    }
    Ok(())
}
