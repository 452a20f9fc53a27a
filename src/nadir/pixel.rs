pub(crate) type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

pub(crate) fn premultiply(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    [
        mul_div255(u16::from(px[0]), a),
        mul_div255(u16::from(px[1]), a),
        mul_div255(u16::from(px[2]), a),
        px[3],
    ]
}

pub(crate) fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = u32::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    if a == 255 {
        return px;
    }
    let un = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/nadir/pixel.rs"]
mod tests;
