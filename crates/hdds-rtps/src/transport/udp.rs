// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP transport: socket2 for socket setup, mio for readiness polling.
//!
//! Unicast channels bind the locator's own address (wildcard when it is
//! unspecified); multicast channels bind the wildcard address on the group
//! port with address/port reuse and join the group on every interface.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};

use super::multicast::join_multicast_group;
use super::{ListenTransport, ReceiveChannel, SendTransport};
use crate::config::LISTEN_PORT_PROBE_COUNT;
use crate::core::types::Locator;

const SOCKET_TOKEN: Token = Token(0);

/// Listen transport producing mio-polled UDP receive channels.
#[derive(Debug, Clone, Default)]
pub struct UdpListenTransport {
    /// SO_RCVBUF hint (0 = OS default).
    pub receive_buffer_size: usize,
}

impl UdpListenTransport {
    pub fn new(receive_buffer_size: usize) -> Self {
        Self {
            receive_buffer_size,
        }
    }

    fn bind(&self, addr: SocketAddr, reuse: bool) -> io::Result<Socket> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        if reuse {
            socket.set_reuse_address(true)?;
            #[cfg(unix)]
            set_reuseport(&socket)?;
        }
        if self.receive_buffer_size > 0 {
            if let Err(e) = socket.set_recv_buffer_size(self.receive_buffer_size) {
                log::debug!("[UDP] SO_RCVBUF {} rejected: {}", self.receive_buffer_size, e);
            }
        }
        socket.bind(&addr.into())?;
        Ok(socket)
    }

    fn open_unicast(&self, locator: &Locator, addr: SocketAddr, is_fixed: bool) -> io::Result<Socket> {
        let first = addr.port();
        let probes = if is_fixed || first == 0 {
            1
        } else {
            LISTEN_PORT_PROBE_COUNT
        };

        let mut last_err = None;
        for offset in 0..probes {
            let Some(port) = first.checked_add(offset as u16) else {
                break;
            };
            match self.bind(SocketAddr::new(addr.ip(), port), false) {
                Ok(socket) => return Ok(socket),
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    log::debug!("[UDP] {} port {} in use, probing next", locator, port);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::AddrInUse)))
    }
}

impl ListenTransport for UdpListenTransport {
    fn open(
        &self,
        locator: &Locator,
        is_multicast: bool,
        is_fixed: bool,
    ) -> io::Result<Box<dyn ReceiveChannel>> {
        let addr = locator.to_socket_addr().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("locator {:?} has no socket address", locator),
            )
        })?;

        let socket = if is_multicast {
            let IpAddr::V4(group) = addr.ip() else {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "IPv6 multicast listen is not supported",
                ));
            };
            let socket = self.bind(
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), addr.port()),
                true,
            )?;
            join_multicast_group(&socket, group)?;
            socket
        } else {
            self.open_unicast(locator, addr, is_fixed)?
        };

        let bound_port = socket
            .local_addr()?
            .as_socket()
            .map(|a| a.port())
            .unwrap_or(addr.port());
        let resolved = locator.with_port(u32::from(bound_port));

        socket.set_nonblocking(true)?;
        let std_socket: UdpSocket = socket.into();
        let mut mio_socket = mio::net::UdpSocket::from_std(std_socket);
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut mio_socket, SOCKET_TOKEN, Interest::READABLE)?;

        log::debug!(
            "[UDP] listening on {} (requested {}, multicast={})",
            resolved,
            locator,
            is_multicast
        );
        Ok(Box::new(UdpReceiveChannel {
            socket: mio_socket,
            poll,
            events: Events::with_capacity(8),
            locator: resolved,
        }))
    }
}

/// mio-registered UDP socket bound to one locator.
pub struct UdpReceiveChannel {
    socket: mio::net::UdpSocket,
    poll: Poll,
    events: Events,
    locator: Locator,
}

impl ReceiveChannel for UdpReceiveChannel {
    fn locator(&self) -> Locator {
        self.locator
    }

    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        // Drain first: readiness is edge-triggered.
        match self.socket.recv_from(buf) {
            Ok((len, _src)) => return Ok(Some(len)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }

        if let Err(e) = self.poll.poll(&mut self.events, Some(timeout)) {
            if e.kind() == io::ErrorKind::Interrupted {
                return Ok(None);
            }
            return Err(e);
        }

        match self.socket.recv_from(buf) {
            Ok((len, _src)) => Ok(Some(len)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Participant-wide UDP sender.
#[derive(Debug)]
pub struct UdpSendTransport {
    socket: UdpSocket,
}

impl UdpSendTransport {
    /// Bind the send socket on `port`, falling back to an ephemeral port
    /// when it is taken.
    pub fn bind(port: u32, send_buffer_size: usize) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        if send_buffer_size > 0 {
            if let Err(e) = socket.set_send_buffer_size(send_buffer_size) {
                log::debug!("[UDP] SO_SNDBUF {} rejected: {}", send_buffer_size, e);
            }
        }

        let port = u16::try_from(port).unwrap_or(0);
        let wanted = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        if let Err(e) = socket.bind(&wanted.into()) {
            log::debug!("[UDP] send port {} unavailable ({}), using ephemeral", port, e);
            socket.bind(&SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0).into())?;
        }
        socket.set_multicast_loop_v4(true)?;
        let _ = socket.set_multicast_ttl_v4(1);

        Ok(Self {
            socket: socket.into(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl SendTransport for UdpSendTransport {
    fn send_to(&self, data: &[u8], destination: &Locator) -> io::Result<usize> {
        let addr = destination.to_socket_addr().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("locator {:?} has no socket address", destination),
            )
        })?;
        self.socket.send_to(data, addr)
    }
}

/// Enable SO_REUSEPORT so several processes can share a multicast port.
#[cfg(unix)]
fn set_reuseport(socket: &Socket) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let fd = socket.as_raw_fd();
    let optval: libc::c_int = 1;
    // SAFETY: setsockopt FFI with valid fd, standard socket option, and correctly sized optval pointer
    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
