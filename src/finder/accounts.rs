//! User and group resolution
//!
//! The `owner`/`group` criteria and the `user`/`group` output fields need to
//! translate between names and numeric ids. That lookup is handed to the
//! finder as an [`AccountDb`] so callers can substitute their own tables.

use std::ffi::{CStr, CString};
use std::io;
use std::mem::MaybeUninit;
use std::ptr;

use log::debug;

/// Name <-> id lookups for users and groups
pub trait AccountDb: Send + Sync {
    fn uid_by_name(&self, name: &str) -> Option<u32>;

    fn gid_by_name(&self, name: &str) -> Option<u32>;

    fn user_name(&self, uid: u32) -> Option<String>;

    fn group_name(&self, gid: u32) -> Option<String>;
}

/// Resolves accounts through the system passwd/group databases (NSS).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAccounts;

const INITIAL_BUF_LEN: usize = 1024;
const MAX_BUF_LEN: usize = 1 << 20;

/// Run one of the reentrant `get*_r` calls, growing the scratch buffer on
/// `ERANGE`. `call` gets the output record, the buffer and the result slot,
/// and returns the libc error code.
fn lookup<T, R>(
    mut call: impl FnMut(*mut T, &mut [libc::c_char], *mut *mut T) -> libc::c_int,
    extract: impl FnOnce(&T) -> R,
) -> Option<R> {
    let mut buf_len = INITIAL_BUF_LEN;
    loop {
        let mut record = MaybeUninit::<T>::uninit();
        let mut buf = vec![0 as libc::c_char; buf_len];
        let mut result: *mut T = ptr::null_mut();

        let rc = call(record.as_mut_ptr(), &mut buf, &mut result as *mut *mut T);
        if rc == libc::ERANGE && buf_len < MAX_BUF_LEN {
            buf_len *= 2;
            continue;
        }
        if rc != 0 {
            debug!("account lookup failed: {}", io::Error::from_raw_os_error(rc));
            return None;
        }
        if result.is_null() {
            return None;
        }
        // SAFETY: a zero return with a non-null result means libc filled in
        // `record`, and the strings it points to live in `buf`, which is
        // still alive here.
        return Some(extract(unsafe { &*result }));
    }
}

/// Copy a C string owned by a passwd/group record.
///
/// # Safety
/// `ptr` must be null or point to a NUL terminated string.
unsafe fn owned_name(ptr: *const libc::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

impl AccountDb for SystemAccounts {
    fn uid_by_name(&self, name: &str) -> Option<u32> {
        let name = CString::new(name).ok()?;
        lookup::<libc::passwd, _>(
            |pwd, buf, result| unsafe {
                libc::getpwnam_r(name.as_ptr(), pwd, buf.as_mut_ptr(), buf.len(), result)
            },
            |pwd| pwd.pw_uid,
        )
    }

    fn gid_by_name(&self, name: &str) -> Option<u32> {
        let name = CString::new(name).ok()?;
        lookup::<libc::group, _>(
            |grp, buf, result| unsafe {
                libc::getgrnam_r(name.as_ptr(), grp, buf.as_mut_ptr(), buf.len(), result)
            },
            |grp| grp.gr_gid,
        )
    }

    fn user_name(&self, uid: u32) -> Option<String> {
        lookup::<libc::passwd, _>(
            |pwd, buf, result| unsafe {
                libc::getpwuid_r(uid, pwd, buf.as_mut_ptr(), buf.len(), result)
            },
            |pwd| unsafe { owned_name(pwd.pw_name) },
        )
        .flatten()
    }

    fn group_name(&self, gid: u32) -> Option<String> {
        lookup::<libc::group, _>(
            |grp, buf, result| unsafe {
                libc::getgrgid_r(gid, grp, buf.as_mut_ptr(), buf.len(), result)
            },
            |grp| unsafe { owned_name(grp.gr_name) },
        )
        .flatten()
    }
}
