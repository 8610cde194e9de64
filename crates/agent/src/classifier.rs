//! Splits an annotated forest into per-module views.
//!
//! Inclusion is conservative: a node enters the view for module `M` when its
//! category is `M`, `mixed` or `unknown`. An excluded node takes its whole
//! subtree with it. Inputs are never mutated.

use catalogist_core::catalog::{CatalogNode, Category, Forest, ModuleType};
use serde::Serialize;

/// The category the splitter uses for `node`.
pub fn classify_node(node: &CatalogNode) -> Category {
    node.category
}

fn belongs_to(node: &CatalogNode, module: ModuleType) -> bool {
    match classify_node(node) {
        Category::Mixed | Category::Unknown => true,
        category => category == Category::from(module),
    }
}

/// Filtered copy of `forest` for one module.
pub fn extract_view(forest: &[CatalogNode], module: ModuleType) -> Forest {
    forest
        .iter()
        .filter(|node| belongs_to(node, module))
        .map(|node| CatalogNode {
            children: extract_view(&node.children, module),
            ..node.clone()
        })
        .collect()
}

/// The three module views of one forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogViews {
    pub business: Forest,
    pub technical: Forest,
    pub pricing: Forest,
}

impl CatalogViews {
    pub fn get(&self, module: ModuleType) -> &Forest {
        match module {
            ModuleType::Business => &self.business,
            ModuleType::Technical => &self.technical,
            ModuleType::Pricing => &self.pricing,
        }
    }
}

pub fn classify_and_split(forest: &[CatalogNode]) -> CatalogViews {
    CatalogViews {
        business: extract_view(forest, ModuleType::Business),
        technical: extract_view(forest, ModuleType::Technical),
        pricing: extract_view(forest, ModuleType::Pricing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogist_core::catalog::nodes_per_level;
    use serde_json::json;

    fn annotated() -> Forest {
        vec![
            CatalogNode::new("商务标")
                .with_category(Category::Business)
                .with_children(vec![
                    CatalogNode::new("投标函").with_category(Category::Business),
                    CatalogNode::new("偏离表").with_category(Category::Mixed).with_children(vec![
                        CatalogNode::new("商务偏离表").with_category(Category::Business),
                        CatalogNode::new("技术偏离表").with_category(Category::Technical),
                    ]),
                ]),
            CatalogNode::new("技术标")
                .with_category(Category::Technical)
                .with_children(vec![CatalogNode::new("施工方案").with_category(Category::Technical)]),
            CatalogNode::new("报价表")
                .with_category(Category::Pricing)
                .with_children(vec![CatalogNode::new("开标一览表").with_category(Category::Pricing)]),
            CatalogNode::new("附件"),
        ]
    }

    #[test]
    fn parent_kept_as_unknown_child_pruned() {
        let forest: Forest = serde_json::from_value(json!([
            {"name": "商务标", "children": [{"name": "投标函", "category": "business"}]}
        ]))
        .unwrap();

        let view = extract_view(&forest, ModuleType::Technical);
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!([{"name": "商务标", "category": "unknown", "children": []}])
        );
    }

    #[test]
    fn views_filter_by_category() {
        let views = classify_and_split(&annotated());

        let names = |forest: &Forest| forest.iter().map(|n| n.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&views.business), vec!["商务标", "附件"]);
        assert_eq!(names(&views.technical), vec!["技术标", "附件"]);
        assert_eq!(names(&views.pricing), vec!["报价表", "附件"]);

        let deviation = &views.business[0].children[1];
        assert_eq!(deviation.name, "偏离表");
        assert_eq!(deviation.children.len(), 1);
        assert_eq!(deviation.children[0].name, "商务偏离表");
    }

    #[test]
    fn mixed_and_unknown_appear_in_every_view() {
        let forest = vec![
            CatalogNode::new("偏离表").with_category(Category::Mixed),
            CatalogNode::new("其他材料"),
        ];
        let views = classify_and_split(&forest);
        for module in ModuleType::ALL {
            assert_eq!(views.get(module), &forest);
        }
    }

    #[test]
    fn views_never_exceed_input_per_level() {
        let forest = annotated();
        let input_levels = nodes_per_level(&forest);
        let views = classify_and_split(&forest);
        for module in ModuleType::ALL {
            let levels = nodes_per_level(views.get(module));
            assert!(levels.len() <= input_levels.len());
            for (depth, count) in levels.iter().enumerate() {
                assert!(*count <= input_levels[depth]);
            }
        }
    }

    #[test]
    fn splitting_a_view_again_is_idempotent() {
        let views = classify_and_split(&annotated());
        for module in ModuleType::ALL {
            let view = views.get(module);
            assert_eq!(&extract_view(view, module), view);
        }
    }

    #[test]
    fn extra_fields_and_descriptions_are_copied() {
        let forest: Forest = serde_json::from_value(json!([
            {"name": "报价说明", "category": "pricing", "content_description": "说明", "id": "n-3"}
        ]))
        .unwrap();
        let views = classify_and_split(&forest);
        assert_eq!(views.pricing, forest);
        assert!(views.business.is_empty());
        assert_eq!(serde_json::to_value(&views.technical).unwrap(), json!([]));
    }

    #[test]
    fn input_is_not_mutated() {
        let forest = annotated();
        let before = forest.clone();
        let _ = classify_and_split(&forest);
        assert_eq!(forest, before);
    }
}
