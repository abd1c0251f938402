//! Command-line interface for the ergraph utility
//!
//! Loads an entity-relationship diagram payload, applies display mode,
//! width and module-group selection, and exports draw.io XML.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use ergraph::core::logging::init_logging;
use ergraph::core::{DiagramConfig, ExportFormat};
use ergraph::model::{DiagramPayload, DisplayMode, DisplayModeRegistry};
use ergraph::render::{RenderSurface, SceneSurface};
use ergraph::session::{Command, CommandLoop, Outcome};
use ergraph::source::{module_groups, StaticDataSource};

/// ergraph - Lay out entity-relationship diagrams and export them to draw.io
#[derive(Parser)]
#[command(name = "ergraph")]
#[command(about = "Lay out entity-relationship diagrams and export them to draw.io")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Options shared by every command that loads a diagram
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DiagramArgs {
    /// Diagram payload JSON (use - for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Display mode list JSON; the built-in modes when omitted
    #[arg(long)]
    pub display_modes: Option<PathBuf>,

    /// Display mode to use, by name
    #[arg(short = 'm', long)]
    pub mode: Option<String>,

    /// Module group to show (ALL for every group)
    #[arg(short = 'g', long)]
    pub module_group: Option<String>,

    /// Node width, between 50 and 500
    #[arg(short, long)]
    pub width: Option<String>,

    /// Header height of each node
    #[arg(long)]
    pub head_height: Option<u32>,

    /// Height of each port row
    #[arg(long)]
    pub port_height: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a diagram to draw.io XML
    Export {
        #[command(flatten)]
        diagram: DiagramArgs,

        /// Output file (use - for stdout); defaults to 模型图.drawio
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show node geometry after layout and collapse
    Inspect {
        #[command(flatten)]
        diagram: DiagramArgs,

        /// Collapse this node before printing (repeatable)
        #[arg(short, long)]
        collapse: Vec<String>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the module groups of a diagram
    Groups {
        /// Diagram payload JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the available display modes
    Modes {
        /// Display mode list JSON; the built-in modes when omitted
        #[arg(long)]
        display_modes: Option<PathBuf>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// JSON shape of `inspect --json`
#[derive(Debug, Serialize)]
struct InspectSummary<'a> {
    display_mode: &'a str,
    width: u32,
    nodes: Vec<NodeSummary<'a>>,
    edges: usize,
}

#[derive(Debug, Serialize)]
struct NodeSummary<'a> {
    id: &'a str,
    label: &'a str,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    collapsed: bool,
    ports: Vec<&'a str>,
}

/// Main CLI application
#[derive(Default)]
pub struct ErgraphApp;

impl ErgraphApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // environment variables take precedence over flags
        let log_level_str = std::env::var("ERGRAPH_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var("ERGRAPH_LOG_FORMAT")
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("ergraph v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Export { diagram, output } => self.export_command(diagram, output, cli.verbose),
            Commands::Inspect {
                diagram,
                collapse,
                json,
            } => self.inspect_command(diagram, collapse, json),
            Commands::Groups { input, json } => self.groups_command(input, json),
            Commands::Modes {
                display_modes,
                json,
            } => self.modes_command(display_modes, json),
        }
    }

    fn load_modes(&self, display_modes: Option<PathBuf>) -> Result<Vec<DisplayMode>> {
        match display_modes {
            Some(path) => {
                let content = self.read_input(Some(path))?;
                Ok(serde_json::from_str(&content)?)
            }
            None => Ok(DisplayModeRegistry::builtin().modes().to_vec()),
        }
    }

    /// Load the diagram and apply mode and width selections
    pub fn open(&self, args: DiagramArgs) -> Result<CommandLoop<StaticDataSource, SceneSurface>> {
        let payload = DiagramPayload::from_json(&self.read_input(args.input)?)
            .map_err(|e| anyhow!("Invalid diagram payload: {}", e))?;
        let modes = self.load_modes(args.display_modes)?;

        let mut config = DiagramConfig::from_env();
        if let Some(head_height) = args.head_height {
            config.header_height = head_height;
        }
        if let Some(port_height) = args.port_height {
            config.port_row_height = port_height;
        }

        debug!(
            nodes = payload.nodes.len(),
            edges = payload.edges.len(),
            modes = modes.len(),
            "Diagram input read"
        );
        let source = StaticDataSource::new(payload).with_modes(modes);
        let mut app = CommandLoop::new(source, config, SceneSurface::new())?;

        app.submit(Command::Reload(args.module_group));
        if let Some(mode) = args.mode {
            app.submit(Command::SetDisplayMode(mode));
        }
        if let Some(width) = args.width {
            app.submit(Command::SetWidth(width));
        }
        for result in app.run() {
            result?;
        }
        Ok(app)
    }

    /// Handle the export command
    fn export_command(&self, diagram: DiagramArgs, output: Option<PathBuf>, verbose: bool) -> Result<()> {
        let mut app = self.open(diagram)?;

        let artifact = match app.handle(Command::Export(ExportFormat::Drawio))? {
            Outcome::Exported(artifact) => artifact,
            other => return Err(anyhow!("Unexpected export result: {:?}", other)),
        };
        let xml = String::from_utf8(artifact.bytes)?;
        let output = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));

        info!(bytes = xml.len(), output = %output.display(), "Diagram exported");
        if verbose {
            eprintln!("Exported {} bytes to {}", xml.len(), output.display());
        }
        self.write_output(Some(output), &xml)
    }

    /// Handle the inspect command
    fn inspect_command(&self, diagram: DiagramArgs, collapse: Vec<String>, json: bool) -> Result<()> {
        let mut app = self.open(diagram)?;
        for node_id in collapse {
            debug!(node = node_id.as_str(), "Collapsing node");
            app.handle(Command::ToggleCollapse(node_id))?;
        }

        let session = app.session();
        let surface = session.surface();
        if json {
            let summary = InspectSummary {
                display_mode: &session.active_mode().name,
                width: session.width(),
                nodes: surface
                    .nodes()
                    .map(|n| NodeSummary {
                        id: &n.id,
                        label: &n.label,
                        x: n.rect.x,
                        y: n.rect.y,
                        width: n.rect.width,
                        height: n.rect.height,
                        collapsed: session.collapse().is_collapsed(&n.id),
                        ports: n.ports.iter().map(|p| p.id.as_str()).collect(),
                    })
                    .collect(),
                edges: surface.edges().count(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Display mode: {}", session.active_mode().name);
            for n in surface.nodes() {
                println!(
                    "  {} {} ({}, {}) {}x{} ports={}",
                    n.glyph,
                    n.id,
                    n.rect.x,
                    n.rect.y,
                    n.rect.width,
                    n.rect.height,
                    n.ports.len()
                );
            }
            println!("Edges: {}", surface.edges().count());
        }
        Ok(())
    }

    /// Handle the groups command
    fn groups_command(&self, input: Option<PathBuf>, json: bool) -> Result<()> {
        let payload = DiagramPayload::from_json(&self.read_input(input)?)?;
        let groups = module_groups(&payload.nodes);

        if json {
            println!("{}", serde_json::to_string_pretty(&groups)?);
        } else {
            for group in &groups {
                println!("{}", group);
            }
        }
        Ok(())
    }

    /// Handle the modes command
    fn modes_command(&self, display_modes: Option<PathBuf>, json: bool) -> Result<()> {
        let modes = self.load_modes(display_modes)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&modes)?);
        } else {
            for (index, mode) in modes.iter().enumerate() {
                let marker = if index == 0 { " (default)" } else { "" };
                println!(
                    "{}{}: node={} port={}",
                    mode.name,
                    marker,
                    mode.node_property_name,
                    mode.main_port_property_name
                );
            }
        }
        Ok(())
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content)
                    .map_err(|e| anyhow!("Failed to write output file '{}': {}", path.display(), e))?;
            }
            _ => {
                println!("{}", content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use ergraph::core::Database;
    use std::fs;
    use tempfile::tempdir;

    const DRAW_JSON: &str = r#"{
        "nodes": [
            {"id": "Order", "moduleGroup": "sales", "x": 0, "y": 0,
             "properties": {"name": "Order", "tableName": "t_order"},
             "ports": [{"id": "id", "properties": {"name": "id", "javaClass": "Long", "columnName": "id", "columnType": "bigint"}}]},
            {"id": "Note", "properties": {"name": "Note"}}
        ],
        "edges": []
    }"#;

    fn write_input(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("draw.json");
        fs::write(&path, DRAW_JSON).unwrap();
        path
    }

    #[test]
    fn test_cli_parsing_export_command() {
        let args = vec![
            "ergraph", "export", "--input", "draw.json", "--width", "300", "-g", "sales", "-m", "数据库表",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Export { diagram, output } => {
                assert_eq!(diagram.input.unwrap().to_string_lossy(), "draw.json");
                assert_eq!(diagram.width.as_deref(), Some("300"));
                assert_eq!(diagram.module_group.as_deref(), Some("sales"));
                assert_eq!(diagram.mode.as_deref(), Some("数据库表"));
                assert!(output.is_none());
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_cli_parsing_inspect_collapse() {
        let args = vec!["ergraph", "inspect", "-c", "Order", "-c", "Note", "--json"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Inspect { collapse, json, .. } => {
                assert_eq!(collapse, vec!["Order", "Note"]);
                assert!(json);
            }
            _ => panic!("Expected Inspect command"),
        }
    }

    #[test]
    fn test_cli_log_flags() {
        let args = vec!["ergraph", "--log-level", "debug", "--log-format", "json", "modes"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_open_applies_selections() {
        let dir = tempdir().unwrap();
        let app = ErgraphApp::new()
            .open(DiagramArgs {
                input: Some(write_input(&dir)),
                module_group: Some("sales".to_string()),
                width: Some("300".to_string()),
                head_height: Some(30),
                ..Default::default()
            })
            .unwrap();

        let session = app.session();
        assert_eq!(session.model().nodes().count(), 1);
        let order = session.surface().node("Order").unwrap();
        assert_eq!(order.rect.width, 300);
        assert_eq!(order.rect.height, 54);
    }

    #[test]
    fn test_open_rejects_bad_width() {
        let dir = tempdir().unwrap();
        let result = ErgraphApp::new().open(DiagramArgs {
            input: Some(write_input(&dir)),
            width: Some("20".to_string()),
            ..Default::default()
        });
        let err = result.err().unwrap();
        assert!(err.to_string().contains("Invalid width"));
    }

    #[test]
    fn test_export_command_writes_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.drawio");
        let diagram = DiagramArgs {
            input: Some(write_input(&dir)),
            mode: Some("数据库表".to_string()),
            ..Default::default()
        };

        ErgraphApp::new()
            .export_command(diagram, Some(output.clone()), false)
            .unwrap();

        let xml = fs::read_to_string(&output).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<mxCell id="Order" value="t_order""#));
        assert!(xml.contains(r#"<mxCell id="Order-id" value="id : bigint""#));
    }

    #[test]
    fn test_read_and_write_files() {
        let app = ErgraphApp::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.txt");

        app.write_output(Some(path.clone()), "模型图").unwrap();
        assert_eq!(app.read_input(Some(path)).unwrap(), "模型图");
    }

    #[test]
    fn test_modes_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("displayModes.json");
        fs::write(
            &path,
            r#"[{"name":"plain","nodePropertyName":"name","mainPortPropertyName":"name"}]"#,
        )
        .unwrap();

        let modes = ErgraphApp::new().load_modes(Some(path)).unwrap();
        assert_eq!(modes.len(), 1);
        assert_eq!(ErgraphApp::new().load_modes(None).unwrap().len(), 5);
    }

    #[test]
    fn test_groups_and_inspect_commands_run() {
        let dir = tempdir().unwrap();
        let input = write_input(&dir);
        let app = ErgraphApp::new();
        assert!(app.groups_command(Some(input.clone()), true).is_ok());
        assert!(app
            .inspect_command(
                DiagramArgs {
                    input: Some(input),
                    ..Default::default()
                },
                vec!["Order".to_string()],
                false,
            )
            .is_ok());
    }

    #[test]
    fn test_inspect_unknown_node_fails() {
        let dir = tempdir().unwrap();
        let result = ErgraphApp::new().inspect_command(
            DiagramArgs {
                input: Some(write_input(&dir)),
                ..Default::default()
            },
            vec!["Missing".to_string()],
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_summary_json_shape() {
        let summary = InspectSummary {
            display_mode: "名称-类型",
            width: 220,
            nodes: vec![NodeSummary {
                id: "Order",
                label: "Order",
                x: 0,
                y: 0,
                width: 220,
                height: 40,
                collapsed: true,
                ports: vec![],
            }],
            edges: 0,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["display_mode"], "名称-类型");
        assert_eq!(value["nodes"][0]["height"], 40);
        assert_eq!(value["nodes"][0]["collapsed"], true);
        assert!(value["nodes"][0]["ports"].as_array().unwrap().is_empty());
    }
}
