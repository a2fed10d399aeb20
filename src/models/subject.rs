use super::problem::Language;

/// 学科枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Subject {
    /// 经典力学
    #[serde(rename = "CM")]
    ClassicalMechanics,
    /// 电磁学
    #[serde(rename = "EM")]
    Electromagnetism,
    /// 天体物理、宇宙学和引力
    #[serde(rename = "ACG")]
    Astrophysics,
    /// 光学
    #[serde(rename = "OPT")]
    Optics,
    /// 原子、分子、核和粒子物理
    #[serde(rename = "AMONP")]
    AtomicNuclear,
    /// 量子力学、信息与技术
    #[serde(rename = "QMIT")]
    Quantum,
    /// 热力学与统计力学
    #[serde(rename = "TSM")]
    Thermodynamics,
}

impl Subject {
    /// 获取学科代码
    pub fn code(self) -> &'static str {
        match self {
            Subject::ClassicalMechanics => "CM",
            Subject::Electromagnetism => "EM",
            Subject::Astrophysics => "ACG",
            Subject::Optics => "OPT",
            Subject::AtomicNuclear => "AMONP",
            Subject::Quantum => "QMIT",
            Subject::Thermodynamics => "TSM",
        }
    }

    /// 从代码解析学科
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CM" => Some(Subject::ClassicalMechanics),
            "EM" => Some(Subject::Electromagnetism),
            "ACG" => Some(Subject::Astrophysics),
            "OPT" => Some(Subject::Optics),
            "AMONP" => Some(Subject::AtomicNuclear),
            "QMIT" => Some(Subject::Quantum),
            "TSM" => Some(Subject::Thermodynamics),
            _ => None,
        }
    }

    /// 获取学科描述
    pub fn description(self, language: Language) -> &'static str {
        match language {
            Language::English => self.description_en(),
            Language::Chinese => self.description_zh(),
        }
    }

    fn description_en(self) -> &'static str {
        match self {
            Subject::ClassicalMechanics => "Classical Mechanics: The study of motion and forces on macroscopic objects, from linear motion, circular motion, projectile to planetary orbits.",
            Subject::Electromagnetism => "Electromagnetism: Examines electric/magnetic fields and their interactions with matter, covering RC circuits to Maxwell's equations.",
            Subject::Astrophysics => "Astrophysics, Cosmology & Gravitation: Investigates celestial phenomena, universe evolution, and gravitational interactions at all scales.",
            Subject::Optics => "Optics: Focuses on light behavior (reflection/refraction) and its applications in lenses, lasers, and optical technologies, this section also covers wave-related physics of acoustics.",
            Subject::AtomicNuclear => "Atomic, Molecular, Nuclear & Particle Physics: Studies fundamental particles and their interactions, spanning quarks to complex nuclei. It also contains emergent properties of solids/liquids and novel material design.",
            Subject::Quantum => "Quantum Mechanics, Information & Technology: Explores quantum systems for computing and communication applications.",
            Subject::Thermodynamics => "Thermodynamics & Statistical Mechanics: Analyzes energy transfer and microscopic behavior of particle ensembles.",
        }
    }

    fn description_zh(self) -> &'static str {
        match self {
            Subject::ClassicalMechanics => "经典力学：研究宏观物体的运动和力，从线性运动、圆周运动、抛体运动到行星轨道。",
            Subject::Electromagnetism => "电磁学：研究电场/磁场及其与物质的相互作用，涵盖RC电路到麦克斯韦方程。",
            Subject::Astrophysics => "天体物理、宇宙学和引力：研究天体现象、宇宙演化和各种尺度的引力相互作用。",
            Subject::Optics => "光学：研究光的行为（反射/折射）及其在透镜、激光和光学技术中的应用，本节还包括声学的波动相关物理。",
            Subject::AtomicNuclear => "原子、分子、核和粒子物理：研究基本粒子及其相互作用，从夸克到复杂原子核。还包括固体/液体的涌现性质和新型材料设计。",
            Subject::Quantum => "量子力学、信息与技术：探索量子系统在计算和通信中的应用。",
            Subject::Thermodynamics => "热力学与统计力学：分析能量传递和粒子集合的微观行为。",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
