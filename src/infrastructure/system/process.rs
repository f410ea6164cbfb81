//! Helper processes outside the terminal's foreground group

use std::os::unix::process::CommandExt;
use std::process::Command;

/// `program` started in a process group of its own.
///
/// Ctrl-C in the terminal signals the whole foreground group. Helpers live
/// outside it and are stopped by the recorder instead.
pub fn detached_command(program: &str) -> Command {
    let mut command = Command::new(program);
    command.process_group(0);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{getpgid, getpgrp, Pid};

    #[test]
    fn child_leads_its_own_group() {
        let mut child = detached_command("sleep").arg("5").spawn().unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        let group = getpgid(Some(pid)).unwrap();
        child.kill().unwrap();
        child.wait().unwrap();

        assert_eq!(group, pid);
        assert_ne!(group, getpgrp());
    }
}
