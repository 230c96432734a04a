//! `wharf hash-inputs` command

use anyhow::Result;

use crate::cli::HashInputsArgs;
use wharf::core::workspace::Workspace;
use wharf::ops::hash_inputs;
use wharf::resolver::LocalFirstSolver;
use wharf::sources::{GitSourceManager, GoPackageLister};
use wharf::util::GlobalContext;

pub fn execute(args: HashInputsArgs, ctx: GlobalContext) -> Result<()> {
    let sm = GitSourceManager::from_context(&ctx);
    let workspace = Workspace::from_context(&ctx);
    let solver = LocalFirstSolver::new(&sm, &workspace);

    let memo = hash_inputs(&ctx, args.root.as_deref(), &sm, &GoPackageLister, &solver)?;
    println!("{}", memo);
    Ok(())
}
