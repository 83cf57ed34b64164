mod cmd;
mod ctx;

use clap::{Arg, App, SubCommand};
use log::debug;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use pbxgen::assemble::{self, BuildGraph};
use pbxgen::config::{self, Config, DEFAULT_CONFIG_FILE};
use pbxgen::pbx::file_types;

fn main() {
  // Initialize.
  let commands = cmd::init();

  // Parse the environment variables.
  let env: ctx::Env = envy::prefixed("PBXGEN_").from_env()
    .check(|| "Failed to parse environment variables");

  // Parse the command line.
  let args = App::new(env!("CARGO_PKG_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .about(env!("CARGO_PKG_DESCRIPTION"))
    .arg(Arg::with_name("FOLDER")
         .help("Input folder containing the project configuration")
         .required(true))
    .arg(Arg::with_name("build")
         .short("b")
         .long("build")
         .value_name("FOLDER")
         .help("Where to store the generated project")
         .takes_value(true))
    .arg(Arg::with_name("config")
         .short("c")
         .long("config")
         .value_name("FILE")
         .help("Name of the configuration file")
         .takes_value(true))
    .arg(Arg::with_name("graph")
         .short("g")
         .long("graph")
         .value_name("FILE")
         .help("Build graph to generate the project from")
         .takes_value(true))
    .arg(Arg::with_name("v")
         .short("v")
         .multiple(true)
         .help("Verbosity level"))
    .subcommands(commands.iter().map(|(name, cmd)| {
      cmd.init(SubCommand::with_name(name))
    }))
    .get_matches();

  let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
  if args.is_present("v") {
    logger.filter_level(match args.occurrences_of("v") {
      1 => log::LevelFilter::Debug,
      _ => log::LevelFilter::Trace
    });
  }
  logger.init();

  let input_dir = PathBuf::from(args.value_of("FOLDER").unwrap_or("."))
    .canonicalize()
    .check(|| "Failed to resolve the input folder");
  let build_dir = match args.value_of("build") {
    Some(dir) => {
      std::fs::create_dir_all(dir).check(|| format!("Failed to create build folder ({})", dir));
      PathBuf::from(dir)
    },
    None => std::env::current_dir().check(|| "Failed to get the current folder")
  }.canonicalize().check(|| "Failed to resolve the build folder");

  // Load the project's configuration file.
  let mut config: Config = {
    let path = input_dir.join(args.value_of("config").unwrap_or(DEFAULT_CONFIG_FILE));
    let text = std::fs::read_to_string(&path)
      .check(|| format!("Failed to load config file ({:?})", path));

    Config::from_str(&text)
      .check(|| format!("Failed to read the project file ({:?})", path))
  };

  config::is_supported(&config.min_version).check(|| "Min version check failed");

  if let Some(tool) = &env.build_tool {
    config.info.build_tool = tool.clone();
  }

  (!config.configurations.is_empty()).check(|| "No configurations in project configuration");

  // Load the build graph.
  let mut graph: BuildGraph = {
    let path = input_dir.join(args.value_of("graph").unwrap_or(config.graph.as_str()));
    let text = std::fs::read_to_string(&path)
      .check(|| format!("Failed to load build graph ({:?})", path));

    BuildGraph::from_json(&text)
      .check(|| format!("Failed to read the build graph ({:?})", path))
  };

  let extra = find_files(&input_dir, &config.additional_files)
    .check(|| "Failed to resolve additional files");
  graph.additional_files.extend(extra);

  // Files are relative to the input folder, itself relative to the project.
  let root = pathdiff::diff_paths(&input_dir, &build_dir)
    .and_then(|p| p.to_str().map(str::to_string))
    .filter(|p| !p.is_empty());
  debug!("main group: {:?}", root);

  let project = assemble::assemble(config.name.as_str(), &graph, &config.options(root))
    .check(|| "Failed to assemble the project");

  // Execute the requested command.
  let ctx = ctx::Context {
    commands,
    build_dir,
    env:     &env,
    args:    &args,
    config:  &config,
    project: &project
  };

  let cmd_name = ctx.args.subcommand_name().unwrap_or("gen");
  ctx.commands[cmd_name].run(&ctx)
    .check(|| format!("Failed to run command ({})", cmd_name));
}

fn find_files(dir: &Path, patterns: &[String]) -> ctx::DynResult<Vec<String>> {
  let mut files = Vec::new();
  for pattern in patterns {
    let pattern = dir.join(pattern);
    for m in glob::glob(pattern.to_str().ok_or("Invalid file pattern")?)? {
      let path = m?;
      let name = path.file_name().and_then(|x| x.to_str()).unwrap_or("");
      match path.is_file() || file_types::bundle_file_type(name).is_some() {
        true  => files.push(path.strip_prefix(dir)?.to_string_lossy().into_owned()),
        false => debug!("skipping directory {}", path.display())
      }
    }
  }
  Ok(files)
}

trait Check {
  type R;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display;
}

impl Check for bool {
  type R = ();
  fn check<F, S>(self, msg: F) where F: FnOnce() -> S, S: Display {
    if !self {
      fatal(msg());
    }
  }
}

impl<T, E> Check for Result<T, E> where E: Display {
  type R = T;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display {
    match self {
      Ok (v) => v,
      Err(e) => fatal(format!("{}: {}", msg(), e))
    }
  }
}

fn fatal<S: Display>(msg: S) -> ! {
  eprintln!("{}", msg);
  std::process::exit(1)
}
