use crate::foundation::error::{ReelError, ReelResult};

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Composite premultiplied RGBA8 pixels over an opaque background color.
///
/// `dst` receives fully opaque RGBA8; PNG frames handed to the encoder carry no alpha.
pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let r = s[0] as u16 + mul_div255_u16(bg_r, inv);
        let g = s[1] as u16 + mul_div255_u16(bg_g, inv);
        let b = s[2] as u16 + mul_div255_u16(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

pub(crate) fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let a16 = a as u16;
    [
        mul_div255_u16(r as u16, a16) as u8,
        mul_div255_u16(g as u16, a16) as u8,
        mul_div255_u16(b as u16, a16) as u8,
        a,
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
