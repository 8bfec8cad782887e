//! Process liveness checks.
//!
//! On unix a pid is considered alive as long as the kernel still has an entry
//! for it. Windows recycles process ids aggressively, so there a pid only
//! counts as alive when it runs the same executable image as the caller.

use std::path::PathBuf;

/// Answers whether a recorded pid belongs to a running competing instance.
pub trait LivenessProbe {
    /// `true` if `pid` is a running process that competes for the session.
    /// Any failure to find out is reported as `false`.
    fn is_alive(&self, pid: u32) -> bool;

    /// Executable image of `pid`, if it can be resolved. Used in diagnostics.
    fn image_path(&self, _pid: u32) -> Option<PathBuf> {
        None
    }
}

/// The probe for the platform this binary was built for.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

#[cfg(unix)]
impl LivenessProbe for SystemProbe {
    fn is_alive(&self, pid: u32) -> bool {
        pid != 0 && unix::process_entry_exists(pid)
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn image_path(&self, pid: u32) -> Option<PathBuf> {
        std::fs::read_link(format!("/proc/{pid}/exe")).ok()
    }
}

#[cfg(windows)]
impl LivenessProbe for SystemProbe {
    fn is_alive(&self, pid: u32) -> bool {
        if pid == 0 {
            return false;
        }
        let Some(theirs) = win32::image_of(pid) else {
            return false;
        };
        win32::own_image().is_some_and(|ours| ours == theirs)
    }

    fn image_path(&self, pid: u32) -> Option<PathBuf> {
        use std::{ffi::OsString, os::windows::ffi::OsStringExt};

        win32::image_of(pid).map(|wide| PathBuf::from(OsString::from_wide(&wide)))
    }
}

#[cfg(unix)]
mod unix {
    /// procfs keeps one directory per live process.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn process_entry_exists(pid: u32) -> bool {
        std::path::Path::new(&format!("/proc/{pid}/cmdline")).exists()
    }

    /// Without procfs, send the null signal: only error checking is performed.
    /// `EPERM` still means the slot is taken by someone else's process.
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    pub fn process_entry_exists(pid: u32) -> bool {
        use nix::{errno::Errno, sys::signal::kill, unistd::Pid};

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
    }
}

#[cfg(windows)]
mod win32 {
    use windows::{
        Win32::{
            Foundation::{CloseHandle, HANDLE, MAX_PATH},
            System::Threading::{
                GetCurrentProcess, OpenProcess, PROCESS_NAME_WIN32,
                PROCESS_QUERY_LIMITED_INFORMATION, QueryFullProcessImageNameW,
            },
        },
        core::PWSTR,
    };

    /// Closes the wrapped process handle when dropped.
    struct OwnedProcess(HANDLE);

    impl Drop for OwnedProcess {
        fn drop(&mut self) {
            // SAFETY: the handle came from a successful OpenProcess and is closed once.
            let _ = unsafe { CloseHandle(self.0) };
        }
    }

    /// Full image path of `pid` as UTF-16, or `None` if the process cannot be
    /// opened or queried.
    pub fn image_of(pid: u32) -> Option<Vec<u16>> {
        // SAFETY: OpenProcess has no preconditions; failure is returned as Err.
        let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }.ok()?;
        let process = OwnedProcess(handle);
        query_image(process.0)
    }

    pub fn own_image() -> Option<Vec<u16>> {
        // SAFETY: the pseudo handle is always valid for the calling process
        // and needs no close.
        query_image(unsafe { GetCurrentProcess() })
    }

    fn query_image(handle: HANDLE) -> Option<Vec<u16>> {
        let mut buf = vec![0u16; 32 * MAX_PATH as usize];
        let mut len = u32::try_from(buf.len()).ok()?;
        // SAFETY: `buf` is writable for `len` wide chars; `len` is updated
        // to the number written on success.
        unsafe {
            QueryFullProcessImageNameW(
                handle,
                PROCESS_NAME_WIN32,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            )
        }
        .ok()?;
        buf.truncate(len as usize);
        (!buf.is_empty()).then_some(buf)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_is_alive() {
        assert!(SystemProbe.is_alive(std::process::id()));
    }

    #[test]
    fn pid_zero_is_never_alive() {
        assert!(!SystemProbe.is_alive(0));
    }

    #[test]
    fn out_of_range_pid_is_not_alive() {
        // Above every platform's pid limit.
        assert!(!SystemProbe.is_alive(u32::MAX));
        assert!(!SystemProbe.is_alive(u32::MAX - 1));
    }

    #[test]
    fn exited_child_is_not_alive() {
        let mut child = std::process::Command::new(std::env::current_exe().expect("exe"))
            .arg("--help")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .expect("spawn");
        let pid = child.id();
        child.wait().expect("wait");

        assert!(!SystemProbe.is_alive(pid));
    }

    #[cfg(any(target_os = "linux", target_os = "android", windows))]
    #[test]
    fn own_image_resolves() {
        let image = SystemProbe.image_path(std::process::id()).expect("image");
        assert_eq!(
            image.file_name(),
            std::env::current_exe().expect("exe").file_name()
        );
    }
}
