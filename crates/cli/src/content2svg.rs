//! content2svg - Convert PDF page content streams to SVG
//!
//! Reads decoded content streams (one page per file) and writes one SVG
//! document per page. Resources are not available from a bare content
//! stream, so fonts fall back to a generic family and named resources
//! (images, forms, patterns) are reported and skipped.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use folio_core::geometry::Rectangle;
use folio_core::model::MemoryResources;
use folio_core::output::SvgWriter;
use folio_core::{ConvertOptions, Document, Page, PageConverter};
use memmap2::Mmap;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Convert PDF content streams to SVG.
#[derive(Parser, Debug)]
#[command(name = "content2svg")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more files holding decoded content streams
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Output file for a single input ("-" for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Directory for the output of multiple inputs (defaults to each input's directory)
    #[arg(short = 'O', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Page box as "x1 y1 x2 y2" in default user space
    #[arg(short = 'b', long = "box", default_value = "0 0 612 792")]
    page_box: String,

    /// Clockwise page rotation in degrees
    #[arg(short = 'R', long, default_value = "0")]
    rotation: i32,

    /// Decimal places kept in coordinates
    #[arg(long, default_value = "3")]
    precision: usize,

    /// Minimum stroke width in output units
    #[arg(long = "min-stroke-width", default_value = "0.5")]
    min_stroke_width: f64,

    /// Drop invisible (render mode 3) text
    #[arg(long = "no-hidden-text", action = ArgAction::SetTrue)]
    no_hidden_text: bool,

    /// Skip the attribute optimizer
    #[arg(long = "no-optimize", action = ArgAction::SetTrue)]
    no_optimize: bool,

    /// Indent the SVG output
    #[arg(long, action = ArgAction::SetTrue)]
    pretty: bool,

    /// Print a JSON summary of each converted page to stderr
    #[arg(long, action = ArgAction::SetTrue)]
    stats: bool,
}

/// Summary printed with `--stats`.
#[derive(Debug, Serialize)]
struct PageStats<'a> {
    file: &'a str,
    width: f64,
    height: f64,
    nodes: usize,
    definitions: usize,
    bytes: usize,
}

fn parse_box(s: &str) -> Result<Rectangle> {
    let values = s
        .split([' ', ','])
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .with_context(|| format!("invalid page box {:?}", s))?;
    match values[..] {
        [x1, y1, x2, y2] => {
            let rect = Rectangle::new(x1, y1, x2, y2);
            if rect.is_empty() {
                bail!("page box {:?} is empty", s);
            }
            Ok(rect)
        }
        _ => bail!("page box needs four numbers, got {:?}", s),
    }
}

fn build_options(args: &Args) -> ConvertOptions {
    ConvertOptions {
        precision: args.precision,
        min_stroke_width: args.min_stroke_width,
        include_hidden_text: !args.no_hidden_text,
        optimize_attributes: !args.no_optimize,
        ..Default::default()
    }
}

fn read_page(path: &Path, crop_box: Rectangle, rotation: i32) -> Result<Page> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("cannot read {}", path.display()))?;
    let resources = Arc::new(MemoryResources::new());
    Ok(Page::from_bytes(crop_box, &mmap, resources).with_rotation(rotation))
}

fn output_path(args: &Args, input: &Path) -> PathBuf {
    let name = input.with_extension("svg");
    match (&args.output_dir, name.file_name()) {
        (Some(dir), Some(file)) => dir.join(file),
        _ => name,
    }
}

fn write_document(doc: &Document, out: impl Write, pretty: bool) -> Result<usize> {
    let mut writer = SvgWriter::new(CountingWriter::new(out)).pretty(pretty);
    writer.write_document(doc)?;
    Ok(writer.into_inner().count)
}

/// Counts the bytes written through it, for `--stats`.
struct CountingWriter<W> {
    inner: W,
    count: usize,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.files.len() > 1 && args.outfile != "-" {
        bail!("--outfile takes a single input; use --output-dir for several");
    }

    let crop_box = parse_box(&args.page_box)?;
    let converter = PageConverter::new(build_options(&args))?;

    let pages = args
        .files
        .iter()
        .map(|path| read_page(path, crop_box, args.rotation))
        .collect::<Result<Vec<Page>>>()?;
    log::debug!("converting {} page(s)", pages.len());

    let results = converter.convert_all(&pages);
    for (path, result) in args.files.iter().zip(results) {
        let doc = result.with_context(|| format!("error converting {}", path.display()))?;

        let bytes = if args.files.len() == 1 && args.outfile == "-" {
            let stdout = io::stdout();
            write_document(&doc, BufWriter::new(stdout.lock()), args.pretty)?
        } else {
            let target = if args.files.len() == 1 {
                PathBuf::from(&args.outfile)
            } else {
                output_path(&args, path)
            };
            let file = File::create(&target)
                .with_context(|| format!("cannot create {}", target.display()))?;
            let n = write_document(&doc, BufWriter::new(file), args.pretty)?;
            log::info!("wrote {}", target.display());
            n
        };

        if args.stats {
            let file = path.to_string_lossy();
            let stats = PageStats {
                file: &file,
                width: doc.width,
                height: doc.height,
                nodes: doc.root.count(),
                definitions: doc.defs().map_or(0, |d| d.children.len()),
                bytes,
            };
            eprintln!("{}", serde_json::to_string(&stats)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_box() {
        let rect = parse_box("0 0 612 792").unwrap();
        assert_eq!((rect.width(), rect.height()), (612.0, 792.0));
        assert_eq!(parse_box("10,20,30,40").unwrap(), Rectangle::new(10.0, 20.0, 30.0, 40.0));
        assert!(parse_box("0 0 612").is_err());
        assert!(parse_box("0 0 0 10").is_err());
        assert!(parse_box("a b c d").is_err());
    }

    #[test]
    fn test_output_path() {
        let args = Args::parse_from(["content2svg", "-O", "/tmp/out", "a.txt", "b.txt"]);
        assert_eq!(
            output_path(&args, Path::new("dir/page1.bin")),
            PathBuf::from("/tmp/out/page1.svg")
        );
        let args = Args::parse_from(["content2svg", "a.txt"]);
        assert_eq!(
            output_path(&args, Path::new("dir/page1.bin")),
            PathBuf::from("dir/page1.svg")
        );
    }
}
