//! Man page generator for c2prog
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::PathBuf;

#[path = "../cli.rs"]
mod cli;

/// Roff section listing the compiled-in bus backends and their URIs
fn bus_section() -> String {
    let mut roff = String::from(".SH \"BUS DEVICES\"\n");
    roff.push_str("The bus is selected with \\fB\\-d\\fR \\fItype\\fR://\\fIpath\\fR.\n");
    for bus in c2prog_bus::available_buses() {
        roff.push_str(&format!(".TP\n\\fB{}://\\fR\n", bus.name));
        roff.push_str(&format!("{}.\n", bus.description));
        roff.push_str(&format!(".br\nPath: {}\n", bus.path_help.replace('\\', "\\\\")));
    }
    roff
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let man = clap_mangen::Man::new(cli::Cli::command());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    buffer.extend_from_slice(bus_section().as_bytes());

    let output_path = output_dir.join("c2prog.1");
    fs::write(&output_path, buffer)?;

    println!("Man page generated at: {}", output_path.display());
    println!("View it with: man -l {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_section_lists_backends() {
        let section = bus_section();
        assert!(section.starts_with(".SH \"BUS DEVICES\"\n"));
        for bus in c2prog_bus::available_buses() {
            assert!(section.contains(&format!("\\fB{}://\\fR", bus.name)));
        }
        // No line may start a roff request by accident
        assert!(section
            .lines()
            .filter(|l| !l.starts_with(".SH") && !l.starts_with(".TP") && !l.starts_with(".br"))
            .all(|l| !l.starts_with('.') && !l.starts_with('\'')));
    }
}
