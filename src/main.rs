//! readmore - Truncate HTML behind a "Read more" control

use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use readmore::dom::{parse_document_bytes, serialize};
use readmore::layout::{ClassTransition, TextLayout};
use readmore::{Options, OptionsFile, RootState, Session, truncate_selector};

#[derive(Parser)]
#[command(name = "readmore")]
#[command(version, about = "Truncate HTML behind a \"Read more\" control", long_about = None)]
#[command(after_help = "EXAMPLES:
    readmore post.html -o short.html              Truncate every <body>
    readmore page.html -s .article --max-height 120
    readmore page.html -c readmore.json -s main   Load options from a file")]
struct Cli {
    /// Input HTML file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<String>,

    /// CSS selector for the elements to truncate
    #[arg(short, long, default_value = "body")]
    selector: String,

    /// JSON options file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<String>,

    /// Stop hiding once a root is at most this tall
    #[arg(long)]
    min_height: Option<f32>,

    /// Hide while a root is taller than this
    #[arg(long)]
    max_height: Option<f32>,

    /// Characters per line for height estimation
    #[arg(long, default_value_t = 80)]
    width: usize,

    /// Height of one line
    #[arg(long, default_value_t = 20.0)]
    line_height: f32,

    /// Activate every control after truncating, tagging revealed nodes
    #[arg(long, value_name = "CLASS", num_args = 0..=1, default_missing_value = "revealed")]
    expand: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,

    /// Log more (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn load_options(cli: &Cli) -> readmore::Result<Options> {
    let mut options = match &cli.config {
        Some(path) => OptionsFile::load(path)?.into_options()?,
        None => Options::default(),
    };
    if let Some(min) = cli.min_height {
        options = options.with_min_height(min);
    }
    if let Some(max) = cli.max_height {
        options = options.with_max_height(max);
    }
    options.validate()?;
    Ok(options)
}

fn run(cli: &Cli) -> readmore::Result<()> {
    let options = load_options(cli)?;
    let layout = TextLayout::new(cli.width, cli.line_height);

    let bytes = std::fs::read(&cli.input)?;
    let mut dom = parse_document_bytes(&bytes);
    let mut session = truncate_selector(&mut dom, &cli.selector, &options, &layout)?;

    if !cli.quiet {
        print_summary(&dom, &session);
    }

    if let Some(class) = &cli.expand {
        let expanded = session.expand_all(&mut dom, &mut ClassTransition::new(class.as_str()));
        if !cli.quiet {
            eprintln!("Expanded {expanded} roots");
        }
    }

    let html = serialize(&dom, dom.document());
    match &cli.output {
        Some(path) => std::fs::write(path, html)?,
        None => println!("{html}"),
    }
    Ok(())
}

fn print_summary(dom: &readmore::ArenaDom, session: &Session) {
    if session.is_empty() {
        eprintln!("No elements match the selector");
        return;
    }
    for (i, truncation) in session.iter().enumerate() {
        let root = truncation.root();
        let name = dom
            .element_name(root)
            .map(|n| n.to_string())
            .unwrap_or_default();
        let status = match truncation.state() {
            RootState::Unmarked => "nothing to truncate".to_string(),
            RootState::Fits => "fits".to_string(),
            RootState::Skipped => "already truncated, skipped".to_string(),
            RootState::Truncated => format!("{} nodes hidden", truncation.hidden().len()),
            state => format!("{state:?}").to_lowercase(),
        };
        eprintln!("{:>3}. <{name}>: {status}", i + 1);
    }
}
