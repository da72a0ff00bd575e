//! The `critica init` command.

use std::path::Path;

use anyhow::Result;

use critica_providers::SAMPLE_CONFIG;

pub fn execute() -> Result<()> {
    if Path::new("critica.toml").exists() {
        println!("critica.toml already exists, skipping.");
    } else {
        std::fs::write("critica.toml", SAMPLE_CONFIG)?;
        println!("Created critica.toml");
    }

    std::fs::create_dir_all("samples")?;
    let sample_path = Path::new("samples/lectura.txt");
    if sample_path.exists() {
        println!("samples/lectura.txt already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_READING)?;
        println!("Created samples/lectura.txt");
    }

    println!("\nNext steps:");
    println!("  1. Export GOOGLE_FACTCHECK_API_KEY and OPENAI_API_KEY, or edit critica.toml");
    println!("  2. Run: critica document samples/lectura.txt");
    println!("  3. Run: critica document samples/lectura.txt --verify");

    Ok(())
}

const SAMPLE_READING: &str = "Todos los jóvenes de hoy son perezosos y nunca leen. \
Obviamente la culpa es de los teléfonos móviles. \
Según una encuesta reciente, el 70% de los estudiantes pasa más de cinco horas al día frente a una pantalla.
";
