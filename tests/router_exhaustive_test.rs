#[test]
fn router_should_not_use_wildcard_arms() {
    // 新增载荷类型时路由必须编译失败，而不是被通配分支静默吞掉
    let src = include_str!("../src/notification/router.rs");
    assert!(
        !src.contains("_ =>"),
        "src/notification/router.rs matches payloads with a wildcard arm"
    );
}
