//! `folium-generate <template.json> <out.pdf>`: reads a template JSON file,
//! runs the full generation pipeline, and writes the resulting PDF. Any
//! non-fatal diagnostics collected along the way are printed to stderr.

extern crate folium;

use std::env;
use std::fs;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("folium-generate: {}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let template_path = args.next().ok_or("usage: folium-generate <template.json> <out.pdf>")?;
    let out_path = args.next().ok_or("usage: folium-generate <template.json> <out.pdf>")?;

    let template_json = fs::read(&template_path)?;
    let (pdf_bytes, warnings) = folium::generate(&template_json)?;
    fs::write(&out_path, &pdf_bytes)?;

    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}
