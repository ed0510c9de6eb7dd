use std::process::Command;

/// run git with `args` and return its trimmed output, `None` outside of a git checkout
fn git(args: &[&str]) -> Option<String> {
    match Command::new("git").args(args).output() {
        Ok(output) if output.status.success() && !output.stdout.is_empty() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(_) => None,
        Err(err) => {
            println!("cargo::warning=Unable to run git: {err:#}");
            None
        }
    }
}

fn main() {
    let version = git(&["describe", "--long", "--abbrev=7", "--tags"])
        .and_then(|describe| {
            let split = describe.rsplitn(3, '-').collect::<Vec<_>>();
            let [hash, count, tag] = split.as_slice() else {
                return None;
            };
            Some(format!("{}-r{count}-{hash}", tag.trim_start_matches('v')))
        })
        .unwrap_or_else(|| String::from(env!("CARGO_PKG_VERSION")));

    let commit = git(&["log", "--format=[%s]", "-n", "1"]).unwrap_or_else(|| String::from("unknown"));

    println!("cargo::rustc-env=GIT_VERSION={version} {commit}");
}
