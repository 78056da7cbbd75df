use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use crate::budget::Budget;
use crate::error::Error;

use super::Transport;

/// Socket options applied on every connect.
#[derive(Debug, Clone, Copy)]
pub struct TransportOptions {
    pub tcp_nodelay: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self { tcp_nodelay: true }
    }
}

/// Non-blocking TCP socket driven with `ppoll`.
///
/// The descriptor is created on [`connect`](Transport::connect) and released
/// by [`close`](Transport::close) or on drop, exactly once.
#[derive(Debug)]
pub struct TcpTransport {
    fd: libc::c_int,
    options: TransportOptions,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(TransportOptions::default())
    }
}

impl TcpTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { fd: -1, options }
    }

    pub fn is_open(&self) -> bool {
        self.fd >= 0
    }

    fn open_fd(&self) -> Result<libc::c_int, Error> {
        if self.fd < 0 {
            return Err(io::Error::from(io::ErrorKind::NotConnected).into());
        }
        Ok(self.fd)
    }

    /// Wait for `events` on the socket until `deadline`.
    ///
    /// Interrupted polls resume against the same deadline. Error and hangup
    /// conditions count as ready so the following syscall reports them.
    fn wait(
        &self,
        events: libc::c_short,
        operation: &'static str,
        budget: &Budget,
        deadline: Instant,
    ) -> Result<(), Error> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(budget.timeout(operation));
            }
            let ts = libc::timespec {
                tv_sec: remaining.as_secs() as libc::time_t,
                tv_nsec: remaining.subsec_nanos() as libc::c_long,
            };
            let mut pfd = libc::pollfd {
                fd: self.fd,
                events,
                revents: 0,
            };
            let ret = unsafe { libc::ppoll(&mut pfd, 1, &ts, std::ptr::null()) };
            if ret < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err.into());
            }
            if ret == 0 {
                return Err(budget.timeout(operation));
            }
            return Ok(());
        }
    }

    fn socket_error(&self) -> io::Result<()> {
        let mut value: libc::c_int = 0;
        let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
        let ret = unsafe {
            libc::getsockopt(
                self.fd,
                libc::SOL_SOCKET,
                libc::SO_ERROR,
                &mut value as *mut _ as *mut libc::c_void,
                &mut len,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        if value != 0 {
            return Err(io::Error::from_raw_os_error(value));
        }
        Ok(())
    }

    fn set_nodelay(&self) -> io::Result<()> {
        let optval: libc::c_int = 1;
        let ret = unsafe {
            libc::setsockopt(
                self.fd,
                libc::IPPROTO_TCP,
                libc::TCP_NODELAY,
                &optval as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn try_connect(&mut self, addr: SocketAddr, budget: &Budget) -> Result<(), Error> {
        let deadline = Instant::now() + budget.remaining();

        let domain = if addr.is_ipv4() {
            libc::AF_INET
        } else {
            libc::AF_INET6
        };
        let fd = unsafe {
            libc::socket(
                domain,
                libc::SOCK_STREAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                0,
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error().into());
        }
        self.fd = fd;

        if self.options.tcp_nodelay {
            self.set_nodelay()?;
        }

        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        let addr_len = socket_addr_to_sockaddr(addr, &mut storage);
        let ret = unsafe {
            libc::connect(
                fd,
                &storage as *const _ as *const libc::sockaddr,
                addr_len as libc::socklen_t,
            )
        };
        if ret == 0 {
            return Ok(());
        }

        // A non-blocking connect finishes in the background; writability
        // marks completion and SO_ERROR carries the outcome.
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINPROGRESS) | Some(libc::EINTR) => {}
            _ => return Err(err.into()),
        }
        self.wait(libc::POLLOUT, "connect", budget, deadline)?;
        self.socket_error()?;
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, addr: SocketAddr, budget: &Budget) -> Result<(), Error> {
        budget.check("connect")?;
        self.close();
        let result = self.try_connect(addr, budget);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn send(&mut self, buf: &[u8], budget: &Budget) -> Result<usize, Error> {
        budget.check("send")?;
        let fd = self.open_fd()?;
        let deadline = Instant::now() + budget.remaining();
        loop {
            self.wait(libc::POLLOUT, "send", budget, deadline)?;
            let ret = unsafe {
                libc::send(
                    fd,
                    buf.as_ptr() as *const libc::c_void,
                    buf.len(),
                    libc::MSG_NOSIGNAL,
                )
            };
            if ret >= 0 {
                return Ok(ret as usize);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => continue,
                _ => return Err(err.into()),
            }
        }
    }

    fn receive(&mut self, buf: &mut [u8], budget: &Budget) -> Result<usize, Error> {
        budget.check("receive")?;
        let fd = self.open_fd()?;
        let deadline = Instant::now() + budget.remaining();
        loop {
            self.wait(libc::POLLIN, "receive", budget, deadline)?;
            let ret =
                unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) };
            if ret >= 0 {
                return Ok(ret as usize);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => continue,
                _ => return Err(err.into()),
            }
        }
    }

    fn close(&mut self) {
        if self.fd < 0 {
            return;
        }
        unsafe {
            libc::shutdown(self.fd, libc::SHUT_RDWR);
            libc::close(self.fd);
        }
        self.fd = -1;
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Fill `storage` with the C representation of `addr`, returning its length.
fn socket_addr_to_sockaddr(addr: SocketAddr, storage: &mut libc::sockaddr_storage) -> u32 {
    match addr {
        SocketAddr::V4(v4) => {
            let sa = storage as *mut _ as *mut libc::sockaddr_in;
            unsafe {
                (*sa).sin_family = libc::AF_INET as libc::sa_family_t;
                (*sa).sin_port = v4.port().to_be();
                (*sa).sin_addr.s_addr = u32::from_ne_bytes(v4.ip().octets());
            }
            std::mem::size_of::<libc::sockaddr_in>() as u32
        }
        SocketAddr::V6(v6) => {
            let sa = storage as *mut _ as *mut libc::sockaddr_in6;
            unsafe {
                (*sa).sin6_family = libc::AF_INET6 as libc::sa_family_t;
                (*sa).sin6_port = v6.port().to_be();
                (*sa).sin6_flowinfo = v6.flowinfo();
                (*sa).sin6_addr.s6_addr = v6.ip().octets();
                (*sa).sin6_scope_id = v6.scope_id();
            }
            std::mem::size_of::<libc::sockaddr_in6>() as u32
        }
    }
}
