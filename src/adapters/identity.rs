use crate::domain::model::Identity;
use crate::utils::error::{DumpError, Result};
use std::ffi::{CStr, CString, OsStr};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

const MAX_PASSWD_BUFFER: usize = 1 << 20;

/// Resolves a user name against the passwd database.
pub fn lookup_user(name: &str) -> Result<Identity> {
    let c_name = CString::new(name).map_err(|_| DumpError::UnknownIdentity {
        user: name.to_string(),
        reason: "user name contains a null byte".to_string(),
    })?;

    lookup_passwd(name, |pwd, buf, buf_len, result| {
        // SAFETY: every pointer is valid for the duration of the call and
        // `buf_len` is the real length of `buf`.
        unsafe { libc::getpwnam_r(c_name.as_ptr(), pwd, buf, buf_len, result) }
    })
}

/// Identity of the effective user running this process.
pub fn current_user() -> Result<Identity> {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { libc::geteuid() };

    lookup_passwd(&format!("uid {}", uid), |pwd, buf, buf_len, result| {
        // SAFETY: see lookup_user.
        unsafe { libc::getpwuid_r(uid, pwd, buf, buf_len, result) }
    })
}

fn lookup_passwd<F>(label: &str, mut call: F) -> Result<Identity>
where
    F: FnMut(
        *mut libc::passwd,
        *mut libc::c_char,
        libc::size_t,
        *mut *mut libc::passwd,
    ) -> libc::c_int,
{
    let unknown = |reason: String| DumpError::UnknownIdentity {
        user: label.to_string(),
        reason,
    };

    let mut buf_len = 1024usize;
    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut buf = vec![0 as libc::c_char; buf_len];
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = call(pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result);

        if rc == libc::ERANGE && buf_len < MAX_PASSWD_BUFFER {
            buf_len *= 2;
            continue;
        }
        if rc != 0 {
            return Err(unknown(std::io::Error::from_raw_os_error(rc).to_string()));
        }
        if result.is_null() {
            return Err(unknown("no such user".to_string()));
        }

        // SAFETY: a non-null result means `pwd` was filled in and its string
        // fields point into `buf`, which is still alive here.
        let pwd = unsafe { pwd.assume_init() };
        let name = unsafe { c_field(pwd.pw_name) };
        let home = unsafe { c_field(pwd.pw_dir) };

        return Ok(Identity {
            name: String::from_utf8_lossy(name).into_owned(),
            uid: pwd.pw_uid,
            gid: pwd.pw_gid,
            home_dir: PathBuf::from(OsStr::from_bytes(home)),
        });
    }
}

/// # Safety
/// `ptr` must be null or point at a NUL terminated string that outlives the
/// returned slice.
unsafe fn c_field<'a>(ptr: *const libc::c_char) -> &'a [u8] {
    if ptr.is_null() {
        &[]
    } else {
        CStr::from_ptr(ptr).to_bytes()
    }
}
