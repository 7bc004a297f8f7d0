use anyhow::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

/// Embeds the commit hash shown by the `status` command. Container builds
/// without a `.git` directory pass it in through `VERGEN_GIT_SHA` instead.
fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-env-changed=VERGEN_GIT_SHA");

    match std::env::var("VERGEN_GIT_SHA") {
        Ok(sha) if !sha.is_empty() && sha != "unknown" => {
            println!("cargo:rustc-env=VERGEN_GIT_SHA={sha}");
        }
        _ => {
            let gitcl = GitclBuilder::default().sha(true).build()?;
            Emitter::default().add_instructions(&gitcl)?.emit()?;
        }
    }

    Ok(())
}
