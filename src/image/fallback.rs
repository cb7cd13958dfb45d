use super::{ImageReference, ImageSource};

/// 预先筛选过的静态图片
pub const STATIC_POOL: &[&str] = &[
    "https://images.unsplash.com/photo-1518770660439-4636190af475?w=1200&q=80",
    "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?w=1200&q=80",
    "https://images.unsplash.com/photo-1526374965328-7f61d4dc18c5?w=1200&q=80",
    "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=1200&q=80",
    "https://images.unsplash.com/photo-1488590528505-98d2b5aba04b?w=1200&q=80",
    "https://images.unsplash.com/photo-1504639725590-34d0984388bd?w=1200&q=80",
    "https://images.unsplash.com/photo-1555066931-4365d14bab8c?w=1200&q=80",
    "https://images.unsplash.com/photo-1677442136019-21780ecad995?w=1200&q=80",
];

/// 简单的字符串哈希：`h = h * 31 + c`，按 UTF-16 码元计算，32 位回绕
///
/// 只要求确定性，不要求分布质量。
pub fn prompt_hash(prompt: &str) -> u32 {
    prompt
        .encode_utf16()
        .fold(0i32, |h, c| {
            (h << 5).wrapping_sub(h).wrapping_add(i32::from(c))
        })
        .unsigned_abs()
}

/// 按提示词哈希从静态图片池中取一张
pub(super) fn pick(prompt: &str) -> ImageReference {
    let index = prompt_hash(prompt) as usize % STATIC_POOL.len();
    ImageReference {
        url: STATIC_POOL[index].to_string(),
        source: ImageSource::StaticPool,
    }
}
