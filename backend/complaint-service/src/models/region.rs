//! Administrative regions and the departments complaints are routed to.

stored_enum! {
    /// Top-level administrative region.
    pub enum Governorate: "governorate" {
        Cairo => "القاهرة",
        Giza => "الجيزة",
        Alexandria => "الإسكندرية",
        Qalyubia => "القليوبية",
        Sharqia => "الشرقية",
        Dakahlia => "الدقهلية",
        Gharbia => "الغربية",
        Monufia => "المنوفية",
        Beheira => "البحيرة",
        KafrElSheikh => "كفر الشيخ",
        Damietta => "دمياط",
        PortSaid => "بورسعيد",
        Ismailia => "الإسماعيلية",
        Suez => "السويس",
        Faiyum => "الفيوم",
        BeniSuef => "بني سويف",
        Minya => "المنيا",
        Asyut => "أسيوط",
        Sohag => "سوهاج",
        Qena => "قنا",
        Luxor => "الأقصر",
        Aswan => "أسوان",
        RedSea => "البحر الأحمر",
        NewValley => "الوادي الجديد",
        Matrouh => "مطروح",
        NorthSinai => "شمال سيناء",
        SouthSinai => "جنوب سيناء",
    }
}

stored_enum! {
    /// Government department inside a governorate.
    pub enum Administration: "administration" {
        WaterAndSanitation => "مياه الشرب والصرف الصحي",
        Electricity => "الكهرباء",
        NaturalGas => "الغاز الطبيعي",
        Health => "الصحة",
        Education => "التعليم",
        RoadsAndTransport => "الطرق والنقل",
        Cleanliness => "النظافة والتجميل",
        Housing => "الإسكان",
        Traffic => "المرور",
        LocalUnit => "الوحدة المحلية",
        SocialSolidarity => "التضامن الاجتماعي",
        Supply => "التموين والتجارة الداخلية",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_governorate_list_is_complete() {
        assert_eq!(Governorate::ALL.len(), 27);
    }

    #[test]
    fn test_labels_parse_back() {
        for g in Governorate::ALL {
            assert_eq!(Governorate::from_str(g.as_str()).unwrap(), *g);
        }
        for a in Administration::ALL {
            assert_eq!(Administration::from_str(a.as_str()).unwrap(), *a);
        }
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = Governorate::from_str("Atlantis").unwrap_err();
        assert_eq!(err.kind, "governorate");
        assert!(Administration::from_str("").is_err());
    }

    #[test]
    fn test_serde_uses_stored_label() {
        let json = serde_json::to_string(&Governorate::Cairo).unwrap();
        assert_eq!(json, "\"القاهرة\"");
        let parsed: Administration = serde_json::from_str("\"الكهرباء\"").unwrap();
        assert_eq!(parsed, Administration::Electricity);
    }
}
