use clap::Parser;
use dino_asm::assembler::Assembler;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "das")]
#[command(about = "dino bytecode assembler")]
struct Args {
    input: PathBuf,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let source = fs::read_to_string(&args.input)?;
    let output_path = args
        .output
        .unwrap_or_else(|| args.input.with_extension("bin"));

    let mut assembler = Assembler::new();
    assembler.load(&source);
    assembler.run()?;

    fs::write(&output_path, assembler.output())?;

    println!("bytecode is {} bytes in size", assembler.output().len());
    println!("wrote bytecode to `{}`", output_path.display());

    Ok(())
}
