// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 校验消息不依赖全局 locale: 每条消息同时取 ja/en 两个版本,
// 保证 validate 的引用透明性 (同一输入永远得到字节一致的结果)
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::Bilingual;

/// 按指定 locale 翻译消息（不触碰全局 locale）
///
/// i18n! 宏会在 crate 根生成 _rust_i18n_translate(locale, key)
pub fn t_in(locale: &str, key: &str) -> String {
    crate::_rust_i18n_translate(locale, key).to_string()
}

/// 按指定 locale 翻译消息（带 %{name} 形式参数）
pub fn t_args_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let mut result = t_in(locale, key);
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 取某个 key 的 ja/en 双语消息对
pub fn bilingual(key: &str) -> Bilingual {
    Bilingual {
        ja: t_in("ja", key),
        en: t_in("en", key),
    }
}

/// 取某个 key 的 ja/en 双语消息对（带参数）
pub fn bilingual_args(key: &str, args: &[(&str, &str)]) -> Bilingual {
    Bilingual {
        ja: t_args_in("ja", key, args),
        en: t_args_in("en", key, args),
    }
}
