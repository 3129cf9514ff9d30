//! Side-channel upload socket
//!
//! After a `send_image` request the TV opens a one-shot socket and tells us
//! where it is. The image header and bytes are streamed there, over TLS when
//! the TV asks for it.

use crate::device::messages::{upload_header, ConnInfo};
use crate::device::tls::{insecure_client_config, server_name_for};
use crate::device::traits::DeviceError;
use log::debug;
use rustls::{ClientConnection, StreamOwned};
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Stream `data` to the socket described by `conn`
///
/// Blocking; run it on a blocking thread.
pub fn send_image_blocking(
    conn: &ConnInfo,
    data: &[u8],
    file_type: &str,
    timeout: Duration,
) -> Result<(), DeviceError> {
    let addr = resolve(&conn.ip, conn.port)?;
    let stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| DeviceError::Transfer(format!("connect {}: {}", addr, e)))?;
    stream.set_write_timeout(Some(timeout))?;

    let header = upload_header(data.len(), file_type, &conn.key);
    debug!(
        "Streaming {} bytes to {} (secured: {})",
        data.len(),
        addr,
        conn.secured
    );

    if conn.secured {
        let config = insecure_client_config().map_err(|e| DeviceError::Transfer(e.to_string()))?;
        let server_name =
            server_name_for(&conn.ip).map_err(|e| DeviceError::Transfer(e.to_string()))?;
        let tls = ClientConnection::new(config, server_name)
            .map_err(|e| DeviceError::Transfer(e.to_string()))?;
        let mut stream = StreamOwned::new(tls, stream);
        write_payload(&mut stream, &header, data)?;
        stream.conn.send_close_notify();
        // Best effort: the TV may drop the socket as soon as it has the bytes
        let _ = stream.flush();
    } else {
        let mut stream = stream;
        write_payload(&mut stream, &header, data)?;
    }

    Ok(())
}

/// Write the header frame followed by the image bytes
pub fn write_payload<W: Write>(out: &mut W, header: &[u8], data: &[u8]) -> Result<(), DeviceError> {
    out.write_all(header)
        .and_then(|_| out.write_all(data))
        .and_then(|_| out.flush())
        .map_err(|e| DeviceError::Transfer(e.to_string()))
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, DeviceError> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| DeviceError::Transfer(format!("no address for {}:{}", host, port)))
}
