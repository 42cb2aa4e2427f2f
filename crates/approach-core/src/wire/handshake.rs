//! Two-phase version handshake.
//!
//! After stream establishment, both sides exchange fixed version strings
//! before any framed message flows:
//!
//! 1. The service writes `APPSERVICEV0001` (15 ASCII bytes, no terminator).
//! 2. The client reads exactly those bytes and aborts on mismatch.
//! 3. The client writes `APPCLIENTV0001` (14 bytes).
//! 4. The service reads exactly those bytes and aborts on mismatch.
//!
//! Either side rejecting the exchange closes the connection with
//! [`TransportError::HandshakeFailed`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::TransportError;

/// Version string the service presents, 15 bytes.
pub const SERVICE_HANDSHAKE: [u8; 15] = *b"APPSERVICEV0001";

/// Version string the client presents, 14 bytes.
pub const CLIENT_HANDSHAKE: [u8; 14] = *b"APPCLIENTV0001";

/// Performs the service side of the handshake.
///
/// Writes the service version string, then requires the exact client
/// version string in response.
///
/// # Errors
///
/// Returns [`TransportError::HandshakeFailed`] on a version mismatch or
/// [`TransportError::Io`] when the stream fails; the caller must tear the
/// connection down in either case.
pub async fn handshake_as_service<S>(stream: &mut S) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&SERVICE_HANDSHAKE).await?;
    stream.flush().await?;

    let mut presented = [0u8; CLIENT_HANDSHAKE.len()];
    stream.read_exact(&mut presented).await?;
    if presented != CLIENT_HANDSHAKE {
        return Err(TransportError::HandshakeFailed {
            reason: format!(
                "unexpected client version string {:?}",
                String::from_utf8_lossy(&presented)
            ),
        });
    }

    Ok(())
}

/// Performs the client side of the handshake.
///
/// Requires the exact service version string, then writes the client
/// version string.
///
/// # Errors
///
/// Returns [`TransportError::HandshakeFailed`] on a version mismatch or
/// [`TransportError::Io`] when the stream fails; the caller must tear the
/// connection down in either case.
pub async fn handshake_as_client<S>(stream: &mut S) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut presented = [0u8; SERVICE_HANDSHAKE.len()];
    stream.read_exact(&mut presented).await?;
    if presented != SERVICE_HANDSHAKE {
        return Err(TransportError::HandshakeFailed {
            reason: format!(
                "unexpected service version string {:?}",
                String::from_utf8_lossy(&presented)
            ),
        });
    }

    stream.write_all(&CLIENT_HANDSHAKE).await?;
    stream.flush().await?;

    Ok(())
}
