use std::error::Error;
use std::path::PathBuf;

use lex_ingest::{Genre, IngestOptions, ingest_file_to_jsonl};

fn main() -> Result<(), Box<dyn Error>> {
    // Optional .env for local runs (output dir, log filter).
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    let opts = if args.tolerant {
        IngestOptions::new(&args.document_id, &args.document_type).tolerant()
    } else {
        IngestOptions::new(&args.document_id, &args.document_type)
    };

    let written = ingest_file_to_jsonl(&args.input, &args.output, args.genre, &opts)?;
    println!("{}", written.display());
    Ok(())
}

struct Args {
    input: PathBuf,
    output: PathBuf,
    document_id: String,
    document_type: String,
    genre: Genre,
    tolerant: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut input = None;
    let mut output = None;
    let mut document_id = None;
    let mut document_type = "LEI".to_string();
    let mut genre = Genre::Law;
    let mut tolerant = false;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--doc-id" => document_id = argv.next(),
            "--doc-type" => {
                document_type = argv.next().ok_or_else(|| "--doc-type needs a value".to_string())?;
            }
            "--out" => output = argv.next().map(PathBuf::from),
            "--genre" => {
                let value = argv.next().ok_or_else(|| "--genre needs a value".to_string())?;
                genre = Genre::parse(&value).ok_or(format!("unknown genre '{value}'"))?;
            }
            "--tolerant" => tolerant = true,
            "--help" | "-h" => {
                return Err(usage());
            }
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            other => return Err(format!("unexpected argument '{other}'\n{}", usage())),
        }
    }

    let input = input.ok_or_else(usage)?;
    let document_id = document_id.ok_or_else(|| "--doc-id is required".to_string())?;
    let output = output.unwrap_or_else(|| {
        let dir = std::env::var("LEX_INGEST_OUT").unwrap_or_else(|_| "out".to_string());
        PathBuf::from(dir).join(format!("{document_id}.chunks.jsonl"))
    });

    Ok(Args {
        input,
        output,
        document_id,
        document_type,
        genre,
        tolerant,
    })
}

fn usage() -> String {
    "usage: lex-ingest <input.md> --doc-id <DOC-ID> [--doc-type LEI] [--genre law|acordao] [--out chunks.jsonl] [--tolerant]"
        .to_string()
}
