//! Default fact-key table: ~35 keys with their Chinese synonym lists,
//! carried forward from the original `FACT_KEYS` dictionary.

pub struct FactKeyDef {
    pub key: &'static str,
    pub synonyms: &'static [&'static str],
}

macro_rules! fk {
    ($key:expr, [$($syn:expr),+ $(,)?]) => {
        FactKeyDef { key: $key, synonyms: &[$($syn),+] }
    };
}

pub fn default_fact_keys() -> Vec<FactKeyDef> {
    vec![
        // basic metadata
        fk!("项目名称", ["项目名称", "工程名称", "建设项目名称"]),
        fk!("建设单位", ["建设单位", "业主单位"]),
        fk!("建设地点", ["建设地点", "项目位置", "项目地址"]),
        fk!("项目代码", ["项目代码", "统一社会信用代码"]),
        // scale
        fk!("总占地面积", ["总占地", "总占地面积", "项目占地"]),
        fk!("永久占地", ["永久占地", "永久占地面积"]),
        fk!("临时占地", ["临时占地", "临时占地面积"]),
        fk!("扰动面积", ["扰动面积", "扰动土地面积"]),
        fk!("损毁植被面积", ["损毁植被", "损毁植被面积"]),
        fk!("防治责任范围面积", ["防治责任范围", "防治责任范围面积"]),
        // earthwork
        fk!("挖方", ["挖方", "挖方量", "开挖量"]),
        fk!("填方", ["填方", "填方量", "回填量"]),
        fk!("借方", ["借方", "借土量"]),
        fk!("弃方", ["弃方", "弃方量", "弃渣量"]),
        fk!("外运量", ["外运", "外运量", "弃方外运"]),
        // schedule
        fk!("施工期起", ["施工期", "施工开始", "开工时间"]),
        fk!("施工期止", ["施工期", "施工结束", "竣工时间"]),
        fk!("设计水平年", ["设计水平年", "水平年"]),
        // investment
        fk!("静态投资", ["静态投资", "工程投资", "总投资"]),
        fk!("水土保持投资", ["水土保持投资", "水保投资"]),
        // six indicators
        fk!("治理达标面积", ["治理达标面积", "达标面积"]),
        fk!("水土流失总面积", ["水土流失总面积", "流失总面积"]),
        fk!("防治措施面积", ["防治措施面积", "措施面积"]),
        fk!("渣土防护量", ["渣土防护量", "防护量"]),
        fk!("渣土总量", ["渣土总量", "总渣土量"]),
        fk!("表土保护量", ["表土保护量", "保护表土量"]),
        fk!("可剥离表土量", ["可剥离表土量", "可剥离量"]),
        fk!("恢复面积", ["恢复面积", "已恢复面积"]),
        fk!("可恢复面积", ["可恢复面积", "应恢复面积"]),
        fk!("植被覆盖面积", ["植被覆盖面积", "覆盖面积"]),
        fk!("可绿化面积", ["可绿化面积", "应绿化面积"]),
        // prediction
        fk!("分区面积", ["分区面积", "预测分区面积"]),
        fk!("时段", ["时段", "预测时段"]),
        fk!("侵蚀模数", ["侵蚀模数", "侵蚀强度"]),
        // boolean-ish
        fk!("是否弃渣", ["弃渣", "弃方", "弃土"]),
        fk!("是否临时用地", ["临时用地", "临时占地"]),
        fk!("是否消纳场", ["消纳场", "专门存放地"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_no_duplicate_keys() {
        let keys = default_fact_keys();
        let mut seen = std::collections::HashSet::new();
        for k in &keys {
            assert!(seen.insert(k.key), "duplicate fact key {}", k.key);
        }
    }
}
