use clap::{App, Arg};

use pbxgen::pbx::{Project, TargetId, TargetKind};

use crate::ctx::{Command, Context, RunResult};

pub struct Show;

impl Command for Show {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Displays the targets of the project")
      .arg(Arg::with_name("TARGET")
           .help("Only show this target")
           .required(false))
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let p = ctx.project;
    let filter = ctx.args.subcommand_matches("show").and_then(|m| m.value_of("TARGET"));

    let targets: Vec<TargetId> = match filter {
      None       => p.all_targets().collect(),
      Some(name) => vec!(p.target_by_name(name).ok_or_else(|| format!("No target named {}", name))?)
    };

    for t in targets {
      show_target(p, t);
    }

    Ok(())
  }
}

fn show_target(p: &Project, id: TargetId) {
  let t = p.target(id);
  match &t.kind {
    TargetKind::Native(n) => println!("{} ({})", t.name, n.product_type.identifier()),
    TargetKind::Legacy(l) => println!("{} ({} {})", t.name, l.build_tool_path, l.build_arguments)
  }

  for dep in t.dependencies() {
    if let Some(on) = p.dependency(*dep).target {
      println!("  depends on {}", p.target(on).name);
    }
  }

  if let Some(host) = p.test_host(id) {
    println!("  hosted by {}", p.target(host).name);
  }

  for test in p.linked_test_targets_for_host(id) {
    println!("  hosts {}", p.target(test).name);
  }
}
