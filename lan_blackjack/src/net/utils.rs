use std::io::{self, Read, Write};

use super::{errors::SessionError, packets::WirePacket};

/// Fills `buf` completely, however the transport splits the bytes.
///
/// A zero-length read before the buffer is full means the peer closed the
/// connection. Read timeouts on the underlying socket surface as
/// [`SessionError::Timeout`].
pub fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), SessionError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(SessionError::ConnectionClosed),
            Ok(n) => filled += n,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

/// Sends the whole buffer in one chunk so the peer never sees a packet
/// interleaved with another write.
pub fn write_exact<W: Write>(writer: &mut W, buf: &[u8]) -> Result<(), SessionError> {
    writer.write_all(buf)?;
    writer.flush()?;
    Ok(())
}

pub fn read_packet<P: WirePacket, R: Read>(reader: &mut R) -> Result<P, SessionError> {
    let mut buf = vec![0; P::LEN];
    read_exact(reader, &mut buf)?;
    Ok(P::decode(&buf)?)
}

pub fn write_packet<P: WirePacket, W: Write>(writer: &mut W, packet: &P) -> Result<(), SessionError> {
    write_exact(writer, &packet.encode())
}
