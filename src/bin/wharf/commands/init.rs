//! `wharf init` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::InitArgs;
use wharf::core::workspace::Workspace;
use wharf::ops::{init, InitBackend, InitOptions};
use wharf::resolver::LocalFirstSolver;
use wharf::sources::{GitSourceManager, GoPackageLister};
use wharf::util::GlobalContext;

/// Build the options for `init` from its arguments.
pub fn options(args: &InitArgs) -> InitOptions {
    InitOptions {
        path: args.path.clone().unwrap_or_else(|| PathBuf::from(".")),
        root_import_path: args.root.clone(),
        skip_tools: args.skip_tools,
    }
}

pub fn execute(args: InitArgs, mut ctx: GlobalContext) -> Result<()> {
    if args.offline {
        ctx.set_offline(true);
    }
    let opts = options(&args);

    let sm = GitSourceManager::from_context(&ctx);
    let lister = GoPackageLister;
    let workspace = Workspace::from_context(&ctx);
    let solver = LocalFirstSolver::new(&sm, &workspace).with_lister(&lister);

    let backend = InitBackend {
        sm: &sm,
        lister: &lister,
        workspace: &workspace,
        solver: &solver,
    };
    init(&ctx, &opts, &backend)?;

    Ok(())
}
