//! Item serial command handlers

use anyhow::{Context, Result};
use b4s::serial::{bit_trace, decode_base85, deserialize};
use b4s::{encode_serial, BlockSequence};

/// Handle `serial decode` command
///
/// With `bits`, the raw bytes and the token-split bit trace are printed
/// before the blocks are parsed, so they are still shown when parsing fails.
pub fn decode(serial: &str, json: bool, bits: bool) -> Result<()> {
    let raw = decode_base85(serial.trim()).context("Failed to decode Base85 serial")?;

    if bits {
        println!("Bytes: {}", hex::encode(&raw));
        println!("Bits:  {}", bit_trace(&raw));
    }

    let blocks =
        deserialize(&raw).with_context(|| format!("Failed to decode serial {}", serial.trim()))?;
    println!("{}", render_blocks(&blocks, json)?);
    Ok(())
}

/// Handle `serial encode` command
pub fn encode(text: &str) -> Result<()> {
    println!("{}", encode_text(text)?);
    Ok(())
}

fn encode_text(text: &str) -> Result<String> {
    let blocks: BlockSequence = text.parse().context("Failed to parse block text")?;
    encode_serial(&blocks).context("Failed to encode serial")
}

fn render_blocks(blocks: &BlockSequence, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(blocks).context("Failed to serialize blocks")
    } else {
        Ok(blocks.to_string())
    }
}
