use crate::config::{Config, load_config};
use crate::layout::{LayoutOverrides, compute_layout_with_overrides};
use crate::layout_dump::write_layout_dump;
use crate::parser::load_topology;
use crate::render::{ViewMode, render_svg, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "nmdr", version, about = "Network topology diagram renderer")]
pub struct Args {
    /// Input file (.yaml, .json or .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// View mode
    #[arg(long = "mode", value_enum, default_value = "public")]
    pub mode: Mode,

    /// Layout overrides (JSON with node_positions / edge_waypoints)
    #[arg(long = "overrides")]
    pub overrides: Option<PathBuf>,

    /// PNG width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// PNG height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Debug logging on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Public,
    Admin,
}

impl From<Mode> for ViewMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Public => ViewMode::Public,
            Mode::Admin => ViewMode::Admin,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    let overrides = read_overrides(args.overrides.as_deref())?;
    let mode = ViewMode::from(args.mode);

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let documents = if is_markdown {
        extract_topology_blocks(&input)
    } else {
        vec![input]
    };

    if documents.is_empty() {
        return Err(anyhow::anyhow!("No topology blocks found in input"));
    }

    if documents.len() == 1 {
        return render_document(
            &documents[0],
            &config,
            &overrides,
            mode,
            args.output_format,
            args.output.as_deref(),
        );
    }

    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, documents.len())?;
    for (document, output) in documents.iter().zip(&outputs) {
        render_document(
            document,
            &config,
            &overrides,
            mode,
            args.output_format,
            Some(output),
        )?;
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(env_filter),
        )
        .try_init();
}

fn render_document(
    document: &str,
    config: &Config,
    overrides: &LayoutOverrides,
    mode: ViewMode,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let topology = load_topology(document)?;
    let layout = compute_layout_with_overrides(&topology, &config.layout, overrides);
    match format {
        OutputFormat::Json => write_layout_dump(output, &layout),
        OutputFormat::Svg => write_output_svg(&render_svg(&layout, &config.theme, mode), output),
        OutputFormat::Png => write_png(&render_svg(&layout, &config.theme, mode), output, config),
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
    crate::render::write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: Option<&Path>, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_overrides(path: Option<&Path>) -> Result<LayoutOverrides> {
    let Some(path) = path else {
        return Ok(LayoutOverrides::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read overrides {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid overrides file {}", path.display()))
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn extract_topology_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut fence: Option<&'static str> = None;

    for line in input.lines() {
        let trimmed = line.trim();
        match fence {
            None => fence = detect_topology_fence(trimmed),
            Some(open) if is_fence_end(trimmed, open) => {
                blocks.push(current.join("\n"));
                current.clear();
                fence = None;
            }
            Some(_) => current.push(line),
        }
    }

    blocks
}

fn detect_topology_fence(line: &str) -> Option<&'static str> {
    for fence in ["```", "~~~"] {
        if let Some(rest) = line.strip_prefix(fence) {
            let tag = rest.trim_start_matches(&fence[..1]).trim();
            if tag.split_whitespace().next() == Some("topology") {
                return Some(fence);
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    line.strip_prefix(fence)
        .is_some_and(|rest| rest.trim().is_empty())
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("topology-{}.{}", idx + 1, ext)))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("topology");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((0..count)
        .map(|idx| parent.join(format!("{}-{}.{}", stem, idx + 1, ext)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_topology_blocks() {
        let input = r#"
intro
``` topology
sites:
  - id: hq
    devices: []
```
```yaml
ignored: true
```
~~~topology
sites:
  - id: branch
    devices: []
~~~
"#;
        let blocks = extract_topology_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("id: hq"));
        assert!(blocks[1].contains("id: branch"));
        assert!(!blocks.iter().any(|b| b.contains("ignored")));
    }

    #[test]
    fn unterminated_block_is_skipped() {
        let blocks = extract_topology_blocks("```topology\nsites: []\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn multi_outputs_number_from_the_stem() {
        let outputs =
            resolve_multi_outputs(Some(Path::new("out/net.svg")), OutputFormat::Json, 2)
                .expect("outputs");
        assert_eq!(
            outputs,
            vec![PathBuf::from("out/net-1.json"), PathBuf::from("out/net-2.json")]
        );
    }

    #[test]
    fn multi_outputs_need_a_path() {
        assert!(resolve_multi_outputs(None, OutputFormat::Svg, 2).is_err());
    }

    #[test]
    fn args_parse_mode_and_format() {
        let args = Args::try_parse_from([
            "nmdr", "-i", "net.yaml", "-e", "json", "--mode", "admin", "-v",
        ])
        .expect("args");
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(ViewMode::from(args.mode), ViewMode::Admin);
        assert!(args.verbose);
        assert!(args.width.is_none());
    }
}
