//! 难度等级词表（1–8）

use phf::phf_map;

use super::problem::Language;

static LEVEL_MAP_EN: phf::Map<u8, &'static str> = phf_map! {
    1u8 => "Middle school",
    2u8 => "High school",
    3u8 => "Beginner Olympiad",
    4u8 => "Advanced Olympiad",
    5u8 => "Undergraduate",
    6u8 => "Senior undergraduate",
    7u8 => "Master's",
    8u8 => "PhD qualifying exams",
};

static LEVEL_MAP_ZH: phf::Map<u8, &'static str> = phf_map! {
    1u8 => "初中水平",
    2u8 => "高中水平",
    3u8 => "初级奥赛",
    4u8 => "高级奥赛",
    5u8 => "本科水平",
    6u8 => "高年级本科",
    7u8 => "硕士水平",
    8u8 => "博士资格考试",
};

/// 获取难度标签，超出 1–8 时返回空字符串
pub fn level_label(level: u8, language: Language) -> &'static str {
    let map = match language {
        Language::English => &LEVEL_MAP_EN,
        Language::Chinese => &LEVEL_MAP_ZH,
    };
    map.get(&level).copied().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_labels() {
        assert_eq!(level_label(2, Language::English), "High school");
        assert_eq!(level_label(8, Language::Chinese), "博士资格考试");
        assert_eq!(level_label(0, Language::English), "");
        assert_eq!(level_label(9, Language::Chinese), "");
    }
}
