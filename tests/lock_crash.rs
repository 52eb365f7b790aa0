//! Channel lock: crash release
//!
//! | Test | Description |
//! |------|-------------|
//! | `lock_freed_when_holder_aborts` | A holder killed without cleanup frees the lock |
//!
//! Single test in this binary: it forks, and the child must not inherit
//! other test threads.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::process;

use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, fork};
use readout_card::error::LockError;
use readout_card::lock::ChannelLock;

#[test]
fn lock_freed_when_holder_aborts() {
    let name = format!("ReadoutCard_DMA_crash-{}_lock", process::id());
    let (mut parent_end, mut child_end) = UnixStream::pair().unwrap();

    // SAFETY: the child only binds a socket, writes one byte and aborts.
    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            drop(parent_end);
            let code = match ChannelLock::acquire(&name, false) {
                Ok(lock) => {
                    let _ = child_end.write_all(b"L");
                    let mut wait = [0u8; 1];
                    let _ = child_end.read(&mut wait);
                    // Die holding the lock: no destructor runs.
                    std::mem::forget(lock);
                    process::abort();
                }
                Err(_) => 1,
            };
            process::exit(code);
        }
        ForkResult::Parent { child } => {
            drop(child_end);
            let mut signal = [0u8; 1];
            parent_end.read_exact(&mut signal).unwrap();
            assert_eq!(&signal, b"L");

            let err = ChannelLock::acquire(&name, false).unwrap_err();
            assert!(matches!(err, LockError::BindImmediateFailure { .. }));

            parent_end.write_all(b"Q").unwrap();
            let status = waitpid(child, None).unwrap();
            assert!(matches!(status, WaitStatus::Signaled(_, _, _)));

            let lock = ChannelLock::acquire(&name, false).unwrap();
            assert_eq!(lock.lock_name(), name);
        }
    }
}
