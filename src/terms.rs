//! Static search vocabularies.
//!
//! Two controlled vocabularies drive a harvest run: hemostatic-device names
//! (with trade-name synonyms) and surgical-indicator terms. Both are fixed
//! at compile time and immutable for the lifetime of a run.

/// Hemostatic device vocabulary: canonical name followed by its synonyms
pub const HEMOSTATIC_DEVICES: &[(&str, &[&str])] = &[
    ("Hemoblast", &["Biom'up"]),
    ("Hemoblast Bellows", &["Bellows applicator"]),
    ("Gelfoam", &["Gelatin sponge"]),
    ("Gelfoam Plus", &["Hemostatic kit"]),
    ("Surgifoam", &["Gelatin powder", "Ethicon gelatin"]),
    ("Avitene", &["Microfibrillar Collagen", "MCH", "Davol"]),
    ("Ultrafoam", &["Bard collagen"]),
    ("Helistat", &["Integra sponge"]),
    ("Helitene", &["Absorbable felt", "Integra felt"]),
    ("Instat", &["Microfibrillar"]),
    ("Surgicel", &["Oxidized cellulose", "ORC", "Fibrillar", "Nu-Knit"]),
    ("Arista", &["Plant-based powder", "BD powder"]),
    ("Vitasure", &["Polysaccharide powder", "Starch-based"]),
    ("Thrombin", &["JMI", "Bovine", "Human thrombin"]),
    ("Evithrom", &["Human thrombin", "Ethicon thrombin"]),
    ("RecothRom", &["rThrombin", "ZymoGenetics"]),
    ("Floseal", &["Gelatin-thrombin", "Baxter"]),
    ("SurgiFlo", &["Flowable gelatin", "Ethicon matrix"]),
    ("Tisseel", &["Fibrin sealant", "Fibrin glue", "Baxter fibrin"]),
    ("Evicel", &["Human fibrin", "Crosseal"]),
    ("Vitagel", &["Platelet-based", "Orthovita"]),
    ("Tachosil", &["Fibrin patch"]),
    ("Evarrest", &["Ethicon patch"]),
    ("Vistaseal", &["Dual Applicator"]),
    ("Woundclot", &["ABC", "Core Scientific"]),
    ("Perclot", &["AMP", "CryoLife"]),
    ("Endoclot", &["AMP Plus"]),
    ("Cryoseal", &["Fibrin system", "FS", "Thermogenesis"]),
];

/// Surgical indicator vocabulary: category followed by its terms
pub const UROLOGY_INDICATORS: &[(&str, &[&str])] = &[(
    "Urology Indicators",
    &[
        "urological surgery",
        "vascular surgery",
        "renal transplant",
        "kidney transplant",
        "prostatectomy",
        "nephrectomy",
        "nephrolithotomy",
        "pyeloplasty",
        "ureterectomy",
        "cystectomy",
        "urethrectomy",
        "vasectomy",
        "hydrocelectomy",
        "varicocelectomy",
        "orchiectomy",
        "penectomy",
        "ovariectomy",
        "salpingectomy",
        "hysterectomy",
        "ovariohysterectomy",
        "salpingo-oophorectomy",
        "myomectomy",
        "trachelectomy",
        "vaginectomy",
        "vulvectomy",
        "angioplasty",
        "stenting",
        "endarterectomy",
        "thrombectomy",
        "aneurysm repair",
        "bypass",
        "aortocaval fistula repair",
        "aortoenteric fistula repair",
        "arteriovenous fistula surgery",
        "arteriovenous malformation surgery",
        "renal artery angioplasty",
        "endovascular reconstruction",
        "arterial reconstruction",
        "vein reconstruction",
        "inferior vena cava filter placement",
        "open vascular reconstruction",
        "vena cava reconstruction",
        "urology procedure",
        "urologic operation",
        "genitourinary surgery",
        "GU surgery",
        "vascular procedure",
        "blood vessel surgery",
        "angiosurgery",
        "kidney transplantation",
        "renal grafting",
        "kidney grafting",
        "kidney removal",
        "renal excision",
        "percutaneous nephrolithotomy",
        "kidney stone removal",
        "renal stone removal",
        "ureteropelvic junction repair",
        "UPJ repair",
        "renal PTA",
        "kidney artery stenting",
        "radical prostatectomy",
        "prostate removal",
        "prostate excision",
        "ureter removal",
        "ureteral excision",
        "bladder removal",
        "bladder excision",
        "radical cystectomy",
        "urethra removal",
        "urethral excision",
        "sterilization procedure",
        "male sterilization",
        "hydrocele repair",
        "varicocele repair",
        "testicular vein ligation",
        "testicle removal",
        "testicular excision",
        "orchidectomy",
        "penis removal",
        "penile amputation",
        "ovary removal",
        "oophorectomy",
        "fallopian tube removal",
        "uterus removal",
        "uterine excision",
        "womb removal",
        "ovary and uterus removal",
        "ovary and fallopian tube removal",
        "oophorosalpingectomy",
        "fibroid removal",
        "uterine fibroid excision",
        "leiomyoma excision",
        "cervix removal",
        "cervical excision",
        "vagina removal",
        "vaginal excision",
        "colpectomy",
        "vulva removal",
        "vulvar excision",
        "balloon angioplasty",
        "percutaneous transluminal angioplasty",
        "stent placement",
        "stent insertion",
        "endovascular stenting",
        "carotid endarterectomy",
        "arterial plaque removal",
        "embolectomy",
        "AAA repair",
        "aortic aneurysm repair",
        "vascular bypass",
        "arterial bypass",
        "coronary bypass",
        "CABG",
        "aortocaval shunt repair",
        "aortoenteric connection repair",
        "AV fistula creation",
        "AV fistula repair",
        "vascular access surgery",
        "AVM surgery",
        "AVM resection",
        "EVAR",
        "endovascular aneurysm repair",
        "vascular graft",
        "arterial graft",
        "venous graft",
        "vascular graft placement",
        "IVC filter deployment",
        "caval filter insertion",
        "vascular bypass grafting",
        "IVC reconstruction",
        "caval reconstruction",
    ],
)];

/// Flatten a vocabulary into one term list: each entry contributes its name
/// followed by its synonyms, in declaration order.
pub fn flatten(vocab: &[(&'static str, &[&'static str])]) -> Vec<&'static str> {
    vocab
        .iter()
        .flat_map(|(name, synonyms)| std::iter::once(*name).chain(synonyms.iter().copied()))
        .collect()
}

/// Flattened device term list
pub fn device_terms() -> Vec<&'static str> {
    flatten(HEMOSTATIC_DEVICES)
}

/// Flattened indicator term list
pub fn indicator_terms() -> Vec<&'static str> {
    flatten(UROLOGY_INDICATORS)
}
