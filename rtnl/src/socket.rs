use std::io;
use std::mem::{size_of, zeroed};
use std::os::fd::RawFd;

use crate::consts::PAGE_SIZE;
use crate::error::{Error, Result};
use crate::message::NetlinkFrame;

const SEND_BUF_MIN: libc::c_int = 32 * 1024;

/// Builds a fresh `sockaddr_nl` addressing the kernel (port id 0). Built
/// per call rather than held as a shared constant, since `sockaddr_nl` is
/// `Copy` and cheap, and a stack-local value sidesteps any question of
/// mutable global state.
pub fn kernel_address() -> libc::sockaddr_nl {
    let mut addr: libc::sockaddr_nl = unsafe { zeroed() };
    addr.nl_family = libc::AF_NETLINK as u16;
    addr.nl_pid = crate::consts::PID_KERNEL;
    addr
}

fn local_address(port_id: u32) -> libc::sockaddr_nl {
    let mut addr: libc::sockaddr_nl = unsafe { zeroed() };
    addr.nl_family = libc::AF_NETLINK as u16;
    addr.nl_pid = port_id;
    addr
}

/// An `AF_NETLINK` datagram socket bound to a kernel-assigned port id, with
/// its own monotonically increasing sequence counter. Owned by exactly one
/// logical task between `send` and the matching `recv` — there is no
/// internal locking.
pub struct NetlinkSocket {
    fd: RawFd,
    seq: u32,
    port_id: u32,
}

impl NetlinkSocket {
    pub fn connect(protocol: i32) -> Result<Self> {
        let fd = match unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                protocol,
            )
        } {
            -1 => return Err(Error::SocketOpenFailed(io::Error::last_os_error())),
            fd => fd,
        };

        let mut sock = Self {
            fd,
            seq: 0,
            port_id: 0,
        };

        if let Err(e) = sock.raise_send_buffer() {
            sock.close_fd();
            return Err(e);
        }
        if let Err(e) = sock.bind() {
            sock.close_fd();
            return Err(e);
        }
        if let Err(e) = sock.read_assigned_port() {
            sock.close_fd();
            return Err(e);
        }

        tracing::debug!(fd = sock.fd, port_id = sock.port_id, protocol, "netlink socket open");
        Ok(sock)
    }

    fn raise_send_buffer(&self) -> Result<()> {
        let buflen = SEND_BUF_MIN;
        match unsafe {
            libc::setsockopt(
                self.fd,
                libc::SOL_SOCKET,
                libc::SO_SNDBUF,
                &buflen as *const _ as *const libc::c_void,
                size_of::<libc::c_int>() as libc::socklen_t,
            )
        } {
            -1 => Err(Error::OptionSetFailed(io::Error::last_os_error())),
            _ => Ok(()),
        }
    }

    fn bind(&self) -> Result<()> {
        let addr = local_address(0);
        match unsafe {
            libc::bind(
                self.fd,
                &addr as *const _ as *const libc::sockaddr,
                size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        } {
            -1 => Err(Error::BindFailed(io::Error::last_os_error())),
            _ => Ok(()),
        }
    }

    fn read_assigned_port(&mut self) -> Result<()> {
        let mut addr: libc::sockaddr_nl = unsafe { zeroed() };
        let mut len = size_of::<libc::sockaddr_nl>() as libc::socklen_t;

        match unsafe {
            libc::getsockname(
                self.fd,
                &mut addr as *mut _ as *mut libc::sockaddr,
                &mut len,
            )
        } {
            -1 => Err(Error::BindFailed(io::Error::last_os_error())),
            _ => {
                self.port_id = addr.nl_pid;
                Ok(())
            }
        }
    }

    pub fn port_id(&self) -> u32 {
        self.port_id
    }

    fn next_seq(&mut self) -> u32 {
        self.seq += 1;
        self.seq
    }

    /// Wraps `payload` in a netlink header addressed to `destination` and
    /// transmits it. Returns the sequence number used.
    pub fn send(
        &mut self,
        payload: &[u8],
        msg_type: u16,
        flags: u16,
        destination: &libc::sockaddr_nl,
    ) -> Result<u32> {
        let seq = self.next_seq();
        let header = crate::message::NetlinkHeader::new(msg_type, flags, seq, self.port_id);

        let mut datagram = Vec::with_capacity(16 + payload.len());
        let total_len = (16 + payload.len()) as u32;
        let mut header = header;
        header.nlmsg_len = total_len;
        datagram.extend_from_slice(&header.to_bytes());
        datagram.extend_from_slice(payload);

        tracing::debug!(msg_type, flags, seq, len = datagram.len(), "netlink send");
        self.transmit(&datagram, destination)?;
        Ok(seq)
    }

    /// Sends an already-framed netlink message, still consuming the next
    /// sequence number for this connection's bookkeeping even though the
    /// caller's header carries its own sequence value.
    pub fn send_raw(&mut self, framed: &[u8], destination: &libc::sockaddr_nl) -> Result<u32> {
        let seq = self.next_seq();
        self.transmit(framed, destination)?;
        Ok(seq)
    }

    fn transmit(&self, datagram: &[u8], destination: &libc::sockaddr_nl) -> Result<()> {
        let padded_len = crate::consts::align_of(datagram.len(), crate::consts::NLMSG_ALIGNTO);
        let mut buf = datagram.to_vec();
        buf.resize(padded_len, 0);

        match unsafe {
            libc::sendto(
                self.fd,
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
                0,
                destination as *const _ as *const libc::sockaddr,
                size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        } {
            -1 => Err(Error::SendFailed(io::Error::last_os_error())),
            _ => Ok(()),
        }
    }

    /// Receives a single raw datagram, retrying transparently on `EINTR`.
    /// The caller is expected to size its buffer to one page; rtnetlink
    /// datagrams larger than that only occur in multipart dumps, which the
    /// client layer reassembles across several `recv_raw` calls.
    pub fn recv_raw(&self) -> Result<(Vec<u8>, libc::sockaddr_nl)> {
        let mut from: libc::sockaddr_nl = unsafe { zeroed() };
        let mut buf = [0u8; PAGE_SIZE];

        loop {
            let mut addrlen = size_of::<libc::sockaddr_nl>() as libc::socklen_t;
            match unsafe {
                libc::recvfrom(
                    self.fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                    &mut from as *mut _ as *mut libc::sockaddr,
                    &mut addrlen,
                )
            } {
                -1 => {
                    let err = io::Error::last_os_error();
                    if err.kind() == io::ErrorKind::Interrupted {
                        continue;
                    }
                    return Err(Error::RecvFailed(err));
                }
                n => return Ok((buf[..n as usize].to_vec(), from)),
            }
        }
    }

    /// Receives a single datagram and parses it into its constituent
    /// netlink frames (usually one, occasionally several when the kernel
    /// packs multiple `NLM_F_MULTI` messages into one `recvfrom`).
    pub fn recv(&self) -> Result<(Vec<NetlinkFrame>, libc::sockaddr_nl)> {
        let (buf, from) = self.recv_raw()?;
        Ok((NetlinkFrame::parse_all(&buf), from))
    }

    fn close_fd(&mut self) {
        if self.fd >= 0 {
            tracing::debug!(fd = self.fd, "netlink socket close");
            unsafe { libc::close(self.fd) };
            self.fd = -1;
        }
    }
}

impl Drop for NetlinkSocket {
    fn drop(&mut self) {
        self.close_fd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_address_targets_port_zero() {
        let addr = kernel_address();
        assert_eq!(addr.nl_family, libc::AF_NETLINK as u16);
        assert_eq!(addr.nl_pid, 0);
    }
}
