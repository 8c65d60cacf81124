pub mod stream_protocol;

#[cfg(test)]
mod tests;

pub use stream_protocol::TcpProtocol;
