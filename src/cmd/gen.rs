use clap::{App};
use log::info;
use std::fs;

use pbxgen::pbx;

use crate::ctx::{Command, Context, RunResult};

pub struct Gen;

impl Command for Gen {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Generates the Xcode project")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let path = ctx.project_file();
    let text = pbx::render(ctx.project, &mut ctx.id_generator())?;

    if let Some(dir) = path.parent() {
      fs::create_dir_all(dir)?;
    }

    fs::write(&path, text)?;
    info!("wrote {}", path.display());
    Ok(())
  }
}
