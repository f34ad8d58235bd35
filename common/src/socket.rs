use socket2::{Domain, Socket, Type};
use std::net::{AddrParseError, SocketAddr};

const BACKLOG: i32 = 1024;

/// Creates a non-blocking listening socket with `SO_REUSEADDR` and `SO_REUSEPORT`
/// set, so a restarted process can bind while the old one drains.
pub fn listen_reuse_socket(addr: &SocketAddr) -> Result<Socket, std::io::Error> {
    let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.bind(&(*addr).into())?;
    socket.listen(BACKLOG)?;
    Ok(socket)
}

/// Binds a tokio listener on `addr` through [`listen_reuse_socket`].
pub fn bind(addr: &SocketAddr) -> Result<tokio::net::TcpListener, std::io::Error> {
    let socket = listen_reuse_socket(addr)?;
    tokio::net::TcpListener::from_std(socket.into())
}

/// Parses a listen address. A bare `:port` binds every IPv4 interface.
pub fn parse_address(addr: &str) -> Result<SocketAddr, AddrParseError> {
    let addr = addr.trim();
    if addr.starts_with(':') {
        return format!("0.0.0.0{}", addr).parse();
    }

    addr.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_port_only() {
        let addr = parse_address(":9090").unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:9090");
    }

    #[test]
    fn parse_full_address() {
        let addr = parse_address("127.0.0.1:8080").unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_loopback());

        let addr = parse_address("[::1]:8080").unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_address("localhost").is_err());
        assert!(parse_address(":port").is_err());
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let addr = parse_address("127.0.0.1:0").unwrap();
        let listener = bind(&addr).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
