//! Socket construction for the multicast data path and the unicast
//! retransmission channel.
//!
//! Every function here is transport *setup*; failures are fatal per the
//! error taxonomy and surface as [`TickcastError::Socket`]. The multicast
//! receiver needs `SO_REUSEPORT` and `SO_RCVBUF` before bind, which the
//! standard library does not expose, so it is assembled from raw POSIX calls
//! and handed to `UdpSocket` once configured.

use std::mem;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::os::fd::FromRawFd;
use std::time::Duration;

use crate::error::TickcastError;

fn os_err(context: &str) -> TickcastError {
    TickcastError::Socket(format!("{context}: {}", std::io::Error::last_os_error()))
}

fn sock_err(context: &str, e: std::io::Error) -> TickcastError {
    TickcastError::Socket(format!("{context}: {e}"))
}

/// Create the UDP socket the publisher multicasts from.
///
/// `ttl` 1 scopes datagrams to the local subnet.
pub fn multicast_sender(ttl: u32) -> Result<UdpSocket, TickcastError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|e| sock_err("bind multicast sender", e))?;
    socket
        .set_multicast_ttl_v4(ttl)
        .map_err(|e| sock_err("set multicast TTL", e))?;
    Ok(socket)
}

/// Create a UDP socket joined to `group` on `port`.
///
/// `SO_REUSEPORT` lets multiple subscriber instances share the port, and
/// `rcvbuf_bytes` sizes the kernel buffer that absorbs bursts while the
/// subscriber is busy repairing a gap. `read_timeout` bounds each `recv` so a
/// cooperative shutdown flag can be observed.
pub fn multicast_receiver(
    group: Ipv4Addr,
    port: u16,
    rcvbuf_bytes: usize,
    read_timeout: Option<Duration>,
) -> Result<UdpSocket, TickcastError> {
    // SAFETY: standard POSIX socket setup. The raw fd is either transferred to
    // `UdpSocket::from_raw_fd` exactly once or closed on the error path; errno
    // is captured before close so the diagnostic is accurate.
    let socket = unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0);
        if fd < 0 {
            return Err(os_err("create multicast receiver socket"));
        }

        let one: libc::c_int = 1;
        if libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            (&one as *const libc::c_int).cast(),
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        ) < 0
        {
            let err = os_err("set SO_REUSEPORT");
            libc::close(fd);
            return Err(err);
        }

        let rcvbuf = rcvbuf_bytes.min(i32::MAX as usize) as libc::c_int;
        if libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            (&rcvbuf as *const libc::c_int).cast(),
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        ) < 0
        {
            let err = os_err("set SO_RCVBUF");
            libc::close(fd);
            return Err(err);
        }

        let mut addr: libc::sockaddr_in = mem::zeroed();
        addr.sin_family = libc::AF_INET as libc::sa_family_t;
        addr.sin_addr.s_addr = libc::INADDR_ANY;
        addr.sin_port = port.to_be();
        if libc::bind(
            fd,
            (&addr as *const libc::sockaddr_in).cast(),
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        ) < 0
        {
            let err = os_err("bind multicast receiver");
            libc::close(fd);
            return Err(err);
        }

        let mreq = libc::ip_mreq {
            imr_multiaddr: libc::in_addr { s_addr: u32::from(group).to_be() },
            imr_interface: libc::in_addr { s_addr: libc::INADDR_ANY },
        };
        if libc::setsockopt(
            fd,
            libc::IPPROTO_IP,
            libc::IP_ADD_MEMBERSHIP,
            (&mreq as *const libc::ip_mreq).cast(),
            mem::size_of::<libc::ip_mreq>() as libc::socklen_t,
        ) < 0
        {
            let err = os_err(&format!("join multicast group {group}"));
            libc::close(fd);
            return Err(err);
        }

        UdpSocket::from_raw_fd(fd)
    };

    socket
        .set_read_timeout(read_timeout)
        .map_err(|e| sock_err("set receiver read timeout", e))?;
    Ok(socket)
}

/// Create the non-blocking TCP listener the retransmit server accepts on.
pub fn retrans_listener(port: u16) -> Result<TcpListener, TickcastError> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .map_err(|e| sock_err("bind retransmit listener", e))?;
    listener
        .set_nonblocking(true)
        .map_err(|e| sock_err("set listener non-blocking", e))?;
    Ok(listener)
}

/// Connect to the publisher's retransmit port for one recovery exchange.
///
/// The same `timeout` bounds connect, the request write, and the response
/// read, so a wedged publisher cannot stall the ingest loop indefinitely.
pub fn retrans_connect(addr: SocketAddr, timeout: Duration) -> Result<TcpStream, TickcastError> {
    let stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| sock_err("connect to retransmit server", e))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|e| sock_err("set retransmit read timeout", e))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|e| sock_err("set retransmit write timeout", e))?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsRawFd;

    #[test]
    fn sender_socket_is_usable() {
        let socket = multicast_sender(1).unwrap();
        assert!(socket.local_addr().is_ok());
    }

    #[test]
    fn listener_is_nonblocking_and_connectable() {
        let listener = retrans_listener(0).unwrap();
        assert!(listener.as_raw_fd() >= 0);

        // No pending connection: a non-blocking accept must not hang.
        match listener.accept() {
            Err(e) => assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock),
            Ok(_) => panic!("accept succeeded with no client"),
        }

        let port = listener.local_addr().unwrap().port();
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let _client = retrans_connect(addr, Duration::from_millis(500)).unwrap();
    }
}
