//! Command-line tool for checking and dumping MSE set-file documents.
//!
//! Usage: mse-data [OPTIONS] [FILE]
//!
//! Options:
//!   -t, --to <FORMAT>   Output format (summary, json) [default: summary]
//!   --check             Validate only; exit 0 when the document reads
//!                       cleanly, 1 on fatal errors or warnings
//!   --lenient           Best-effort reading of possibly-damaged documents
//!   -h, --help          Print help
//!   -V, --version       Print version
//!
//! Reads from FILE, or from stdin when FILE is omitted or `-`. The tool
//! decodes the commonly useful subset of a set document: the version block,
//! game and stylesheet names, set information, and the cards.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process;

use chrono::NaiveDateTime;
use libmse::{FileRef, Reader, Result, Version};

/// Set-file format version this tool understands, 2.0.0.
const APP_VERSION: Version = Version::new(20000);

/// Timestamp form used in dumps, the same one the set editor writes.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Default)]
struct SetInfo {
    title: String,
    author: String,
    copyright: String,
    description: String,
}

#[derive(Default)]
struct Card {
    name: String,
    notes: String,
    time_created: Option<NaiveDateTime>,
    time_modified: Option<NaiveDateTime>,
    image: FileRef,
}

#[derive(Default)]
struct SetFile {
    version: Version,
    game: String,
    stylesheet: String,
    info: SetInfo,
    cards: Vec<Card>,
}

fn read_set<R: BufRead>(reader: &mut Reader<R>) -> Result<SetFile> {
    let mut set = SetFile {
        version: reader.file_version(),
        ..SetFile::default()
    };
    while reader.more()? {
        if reader.enter_block("game")? {
            reader.handle_string(&mut set.game)?;
            reader.exit_block()?;
        } else if reader.enter_block("stylesheet")? {
            reader.handle_string(&mut set.stylesheet)?;
            reader.exit_block()?;
        } else if reader.enter_block("set_info")? {
            read_set_info(reader, &mut set.info)?;
            reader.exit_block()?;
        } else if reader.enter_block("card")? {
            let mut card = Card::default();
            read_card(reader, &mut card)?;
            reader.exit_block()?;
            set.cards.push(card);
        } else {
            reader.unknown_key()?;
        }
    }
    Ok(set)
}

fn read_set_info<R: BufRead>(reader: &mut Reader<R>, info: &mut SetInfo) -> Result<()> {
    while reader.more()? {
        if reader.enter_block("title")? {
            reader.handle_string(&mut info.title)?;
            reader.exit_block()?;
        } else if reader.enter_block("author")? {
            reader.handle_string(&mut info.author)?;
            reader.exit_block()?;
        } else if reader.enter_block("copyright")? {
            reader.handle_string(&mut info.copyright)?;
            reader.exit_block()?;
        } else if reader.enter_block("description")? {
            reader.handle_string(&mut info.description)?;
            reader.exit_block()?;
        } else {
            reader.unknown_key()?;
        }
    }
    Ok(())
}

fn read_card<R: BufRead>(reader: &mut Reader<R>, card: &mut Card) -> Result<()> {
    while reader.more()? {
        if reader.enter_block("name")? {
            reader.handle_string(&mut card.name)?;
            reader.exit_block()?;
        } else if reader.enter_block("notes")? {
            reader.handle_string(&mut card.notes)?;
            reader.exit_block()?;
        } else if reader.enter_block("time_created")? {
            let mut time = NaiveDateTime::default();
            reader.handle_date_time(&mut time)?;
            card.time_created = Some(time);
            reader.exit_block()?;
        } else if reader.enter_block("time_modified")? {
            let mut time = NaiveDateTime::default();
            reader.handle_date_time(&mut time)?;
            card.time_modified = Some(time);
            reader.exit_block()?;
        } else if reader.enter_block("image")? {
            reader.handle_file(&mut card.image)?;
            reader.exit_block()?;
        } else {
            reader.unknown_key()?;
        }
    }
    Ok(())
}

// ---- output -----------------------------------------------------------------

fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn json_string(s: &str) -> String {
    format!("\"{}\"", json_escape(s))
}

fn to_json(set: &SetFile) -> String {
    let mut out = String::new();
    out.push_str("{\n");
    out.push_str(&format!("  \"version\": {},\n", set.version.as_u32()));
    out.push_str(&format!("  \"game\": {},\n", json_string(&set.game)));
    out.push_str(&format!(
        "  \"stylesheet\": {},\n",
        json_string(&set.stylesheet)
    ));
    out.push_str("  \"set_info\": {\n");
    out.push_str(&format!("    \"title\": {},\n", json_string(&set.info.title)));
    out.push_str(&format!(
        "    \"author\": {},\n",
        json_string(&set.info.author)
    ));
    out.push_str(&format!(
        "    \"copyright\": {},\n",
        json_string(&set.info.copyright)
    ));
    out.push_str(&format!(
        "    \"description\": {}\n",
        json_string(&set.info.description)
    ));
    out.push_str("  },\n");
    out.push_str("  \"cards\": [");
    for (i, card) in set.cards.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str("\n    {\n");
        out.push_str(&format!("      \"name\": {},\n", json_string(&card.name)));
        out.push_str(&format!("      \"notes\": {},\n", json_string(&card.notes)));
        for (label, time) in [
            ("time_created", card.time_created),
            ("time_modified", card.time_modified),
        ] {
            let value = match time {
                Some(t) => json_string(&t.format(TIME_FORMAT).to_string()),
                None => "null".to_string(),
            };
            out.push_str(&format!("      \"{label}\": {value},\n"));
        }
        out.push_str(&format!(
            "      \"image\": {}\n",
            json_string(card.image.as_str())
        ));
        out.push_str("    }");
    }
    if !set.cards.is_empty() {
        out.push_str("\n  ");
    }
    out.push_str("]\n}\n");
    out
}

fn to_summary(set: &SetFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("version:    {}\n", set.version));
    if !set.game.is_empty() {
        out.push_str(&format!("game:       {}\n", set.game));
    }
    if !set.stylesheet.is_empty() {
        out.push_str(&format!("stylesheet: {}\n", set.stylesheet));
    }
    if !set.info.title.is_empty() {
        out.push_str(&format!("title:      {}\n", set.info.title));
    }
    if !set.info.author.is_empty() {
        out.push_str(&format!("author:     {}\n", set.info.author));
    }
    out.push_str(&format!("cards:      {}\n", set.cards.len()));
    for card in &set.cards {
        if card.name.is_empty() {
            out.push_str("  - (unnamed)\n");
        } else {
            out.push_str(&format!("  - {}\n", card.name));
        }
    }
    out
}

// ---- entry point ------------------------------------------------------------

fn is_format_name(s: &str) -> bool {
    matches!(s, "summary" | "json")
}

fn run<R: BufRead>(input: R, name: &str, lenient: bool, check_only: bool, format: &str) -> i32 {
    let mut reader = match Reader::new(input, name, APP_VERSION, lenient) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {name}: {e}");
            return 1;
        }
    };
    let set = match read_set(&mut reader) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Error: {name}: {e}");
            return 1;
        }
    };
    let warnings = reader.take_warnings();
    if !warnings.is_empty() {
        eprintln!("warnings while reading {name}:");
        for warning in &warnings {
            eprintln!("  {warning}");
        }
    }
    if check_only {
        if warnings.is_empty() {
            println!("{name}: ok");
            0
        } else {
            1
        }
    } else {
        let output = match format {
            "json" => to_json(&set),
            _ => to_summary(&set),
        };
        print!("{output}");
        0
    }
}

fn print_help() {
    println!("Usage: mse-data [OPTIONS] [FILE]");
    println!();
    println!("Check or dump an MSE set-file document.");
    println!();
    println!("Options:");
    println!("  -t, --to <FORMAT>   Output format (summary, json) [default: summary]");
    println!("  --check             Validate only; exit 0 when the document reads");
    println!("                      cleanly, 1 on fatal errors or warnings");
    println!("  --lenient           Best-effort reading of possibly-damaged documents");
    println!("  -h, --help          Print help");
    println!("  -V, --version       Print version");
    println!();
    println!("Reads from FILE, or from stdin when FILE is omitted or '-'.");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut to_format = "summary";
    let mut check_only = false;
    let mut lenient = false;
    let mut input_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("mse-data {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-t" | "--to" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: -t requires a format argument");
                    process::exit(1);
                }
                if !is_format_name(&args[i]) {
                    eprintln!("Error: Unknown format: {}", args[i]);
                    process::exit(1);
                }
                to_format = &args[i];
            }
            "--check" => {
                check_only = true;
            }
            "--lenient" => {
                lenient = true;
            }
            "-" => {
                // explicit stdin; input_path stays None
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {arg}");
                process::exit(1);
            }
            arg => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input files not supported");
                    process::exit(1);
                }
                input_path = Some(arg);
            }
        }
        i += 1;
    }

    let code = match input_path {
        Some(path) => match File::open(path) {
            Ok(file) => run(BufReader::new(file), path, lenient, check_only, to_format),
            Err(e) => {
                eprintln!("Error: {path}: {e}");
                1
            }
        },
        None => run(io::stdin().lock(), "<stdin>", lenient, check_only, to_format),
    };
    process::exit(code);
}
