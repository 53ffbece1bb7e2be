//! Wire format of one message:
//!
//! ```text
//! id: u64 LE | kind: u8 (0 = call, 1 = reply) | len: u32 LE | body: len bytes
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const HEADER_LEN: usize = 8 + 1 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Call = 0,
    Reply = 1,
}

impl TryFrom<u8> for MessageKind {
    type Error = FrameError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            0 => Ok(Self::Call),
            1 => Ok(Self::Reply),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcMessage {
    /// `0` on an outbound message means the transport assigns a fresh id.
    pub id: u64,
    pub kind: MessageKind,
    pub body: Vec<u8>,
}

impl IpcMessage {
    pub fn call(id: u64, body: Vec<u8>) -> Self {
        Self {
            id,
            kind: MessageKind::Call,
            body,
        }
    }

    pub fn reply(id: u64, body: Vec<u8>) -> Self {
        Self {
            id,
            kind: MessageKind::Reply,
            body,
        }
    }

    /// Header and body in one buffer.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let len = u32::try_from(self.body.len()).map_err(|_| FrameError::TooLarge {
            len: self.body.len(),
            max: u32::MAX as usize,
        })?;
        let mut out = Vec::with_capacity(HEADER_LEN + self.body.len());
        out.extend_from_slice(&self.id.to_le_bytes());
        out.push(self.kind as u8);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&self.body);
        Ok(out)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream ended inside a frame")]
    Truncated,
    #[error("unknown message kind {0}")]
    UnknownKind(u8),
    #[error("frame body of {len} bytes exceeds limit of {max}")]
    TooLarge { len: usize, max: usize },
}

/// Reads one frame. `Ok(None)` means the stream ended cleanly on a frame boundary.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Option<IpcMessage>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(FrameError::Truncated)
            };
        }
        filled += n;
    }

    let mut id = [0u8; 8];
    id.copy_from_slice(&header[..8]);
    let kind = MessageKind::try_from(header[8])?;
    let mut len = [0u8; 4];
    len.copy_from_slice(&header[9..]);
    let len = u32::from_le_bytes(len) as usize;
    if len > max_len {
        return Err(FrameError::TooLarge { len, max: max_len });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::Truncated
        } else {
            FrameError::Io(e)
        }
    })?;

    Ok(Some(IpcMessage {
        id: u64::from_le_bytes(id),
        kind,
        body,
    }))
}

pub async fn write_frame<W>(writer: &mut W, msg: &IpcMessage) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let buf = msg.encode()?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_little_endian() {
        let msg = IpcMessage::reply(0x0102, b"hi".to_vec());
        let buf = msg.encode().unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 2);
        assert_eq!(&buf[..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(buf[8], 1);
        assert_eq!(&buf[9..13], &[2, 0, 0, 0]);
        assert_eq!(&buf[13..], b"hi");
    }

    #[tokio::test]
    async fn reads_back_consecutive_frames() {
        let mut wire = Vec::new();
        wire.extend(IpcMessage::call(7, b"abc".to_vec()).encode().unwrap());
        wire.extend(IpcMessage::reply(8, Vec::new()).encode().unwrap());

        let mut reader = wire.as_slice();
        let first = read_frame(&mut reader, 1024).await.unwrap().unwrap();
        assert_eq!(first, IpcMessage::call(7, b"abc".to_vec()));
        let second = read_frame(&mut reader, 1024).await.unwrap().unwrap();
        assert_eq!(second, IpcMessage::reply(8, Vec::new()));
        assert!(read_frame(&mut reader, 1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_bad_frames() {
        let mut buf = IpcMessage::call(1, b"abc".to_vec()).encode().unwrap();
        buf[8] = 9;
        let err = read_frame(&mut buf.as_slice(), 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::UnknownKind(9)));

        let buf = IpcMessage::call(1, vec![0u8; 64]).encode().unwrap();
        let err = read_frame(&mut buf.as_slice(), 16).await.unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { len: 64, max: 16 }));

        let buf = IpcMessage::call(1, b"abcdef".to_vec()).encode().unwrap();
        let err = read_frame(&mut &buf[..HEADER_LEN + 2], 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::Truncated));

        let err = read_frame(&mut &buf[..5], 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::Truncated));
    }
}
