use clap::{App};

use pbxgen::pbx;

use crate::ctx::{Command, Context, RunResult};

pub struct Check;

impl Command for Check {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Checks whether the project can be generated, without writing it")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let mut ids = ctx.id_generator();
    pbx::render(ctx.project, &mut ids)?;

    println!("{}: {} targets, {} objects, configurations {}", ctx.project.name,
             ctx.project.all_targets().count(), ids.count(), ctx.config.configurations.join(", "));
    Ok(())
  }
}
