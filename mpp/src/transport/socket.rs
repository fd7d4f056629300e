//! Address-reusing UDP binds.
//!
//! Several components on one host listen on the shared bus port, so every
//! socket sets `SO_REUSEADDR` before `bind`. The standard library offers no
//! way to set options ahead of binding, hence the raw calls on Linux.

use std::io;
use std::net::{SocketAddr, UdpSocket};

#[cfg(target_os = "linux")]
pub(crate) fn bind_reusable(addr: SocketAddr) -> io::Result<UdpSocket> {
    match addr {
        SocketAddr::V4(v4) => bind_v4_reusable(v4),
        SocketAddr::V6(_) => UdpSocket::bind(addr),
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn bind_reusable(addr: SocketAddr) -> io::Result<UdpSocket> {
    UdpSocket::bind(addr)
}

#[cfg(target_os = "linux")]
fn bind_v4_reusable(addr: std::net::SocketAddrV4) -> io::Result<UdpSocket> {
    use std::mem::size_of;
    use std::os::unix::io::FromRawFd;

    // SAFETY: `fd` is a fresh descriptor that is immediately owned by the
    // returned `UdpSocket`, which closes it on every early return.
    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        let socket = UdpSocket::from_raw_fd(fd);

        let yes: libc::c_int = 1;
        if libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &yes as *const libc::c_int as *const libc::c_void,
            size_of::<libc::c_int>() as libc::socklen_t,
        ) < 0
        {
            return Err(io::Error::last_os_error());
        }

        let mut sin: libc::sockaddr_in = std::mem::zeroed();
        sin.sin_family = libc::AF_INET as libc::sa_family_t;
        sin.sin_port = addr.port().to_be();
        sin.sin_addr = libc::in_addr {
            s_addr: u32::from(*addr.ip()).to_be(),
        };
        if libc::bind(
            fd,
            &sin as *const libc::sockaddr_in as *const libc::sockaddr,
            size_of::<libc::sockaddr_in>() as libc::socklen_t,
        ) < 0
        {
            return Err(io::Error::last_os_error());
        }

        Ok(socket)
    }
}
