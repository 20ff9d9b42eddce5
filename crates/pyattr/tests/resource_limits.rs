/// Resource limits: allocation count, host call recursion and inheritance depth.
use pyattr::{
    ArgValues, ClassBuilder, ExcType, Function, FunctionBody, ResourceLimits, RunError, Session, UserProperty, Value,
};

/// A getter that reads its own property recurses until the depth limit.
#[test]
fn self_recursive_getter_raises_recursion_error() {
    let mut session = Session::with_limits(ResourceLimits::new().max_recursion_depth(Some(50)));
    let getter = session.define_function(Function::new(
        "x",
        1,
        FunctionBody::LoadAttr {
            arg: 0,
            attr: "x".to_owned(),
        },
    ));
    let class = session
        .define_class(ClassBuilder::new("A").property("x", UserProperty::new(getter)))
        .unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let err = session.get_attr(&a, "x").unwrap_err();
    assert!(err.is_exception_type(ExcType::RecursionError));
    assert_eq!(err.to_string(), "RecursionError: maximum recursion depth exceeded");

    // the session stays usable once the stack has unwound
    session.set_instance_attr(&a, "y", 1).unwrap();
    assert_eq!(session.get_attr(&a, "y").unwrap(), Value::Int(1));
}

/// A `__call__` property that yields the instance itself re-dispatches the call
/// forever; the default depth limit stops it.
#[test]
fn call_through_self_returning_call_property_raises_recursion_error() {
    let mut session = Session::new();
    let me = session.define_function(Function::new("me", 1, FunctionBody::ReturnArg(0)));
    let class = session
        .define_class(ClassBuilder::new("A").property("__call__", UserProperty::new(me)))
        .unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let err = session.call(&a, ArgValues::Empty).unwrap_err();
    assert!(err.is_exception_type(ExcType::RecursionError));

    // depth unwound back to zero
    assert!(session.get_attr(&a, "__call__").unwrap().is(&a));
    let err = session.call(&a, Value::Int(1)).unwrap_err();
    assert!(err.is_exception_type(ExcType::RecursionError));
}

/// The `__call__` chain counts against a configured limit too.
#[test]
fn call_chain_respects_configured_limit() {
    let mut session = Session::with_limits(ResourceLimits::new().max_recursion_depth(Some(5)));
    let me = session.define_function(Function::new("me", 1, FunctionBody::ReturnArg(0)));
    let class = session
        .define_class(ClassBuilder::new("A").property("__call__", UserProperty::new(me)))
        .unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let err = session.call(&a, ArgValues::Empty).unwrap_err();
    assert_eq!(err.to_string(), "RecursionError: maximum recursion depth exceeded");
}

/// Exceeding the allocation limit is an uncatchable MemoryError.
#[test]
fn allocation_limit() {
    let mut session = Session::with_limits(ResourceLimits::new().max_allocations(3));
    let f = session.define_function(Function::new("f", 1, FunctionBody::Return(Value::None)));
    // property wrapper + class object
    let class = session
        .define_class(ClassBuilder::new("A").property("p", UserProperty::new(f)).method("f", f))
        .unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    // binding needs a fourth allocation
    let err = session.get_attr(&a, "f").unwrap_err();
    assert!(matches!(err, RunError::UncatchableExc(_)));
    assert_eq!(err.exc_type(), Some(ExcType::MemoryError));
    assert_eq!(err.to_string(), "MemoryError: allocation limit exceeded: 4 > 3");

    // reads that allocate nothing still work
    assert_eq!(session.get_attr(&a, "p").unwrap(), Value::None);
    assert_eq!(session.stats().tracker_allocations, Some(3));
}

#[test]
fn inheritance_depth_limit() {
    let mut session = Session::with_limits(ResourceLimits::new().max_inheritance_depth(2));
    let base = session.define_class(ClassBuilder::new("Base")).unwrap();
    let mid = session
        .define_class(ClassBuilder::new("Mid").parent(base.ref_id().unwrap()))
        .unwrap();

    let err = session
        .define_class(ClassBuilder::new("Leaf").parent(mid.ref_id().unwrap()))
        .unwrap_err();
    assert!(err.is_exception_type(ExcType::TypeError));
    assert_eq!(
        err.to_string(),
        "TypeError: inheritance chain too deep: 'Leaf' would have 3 classes (max 2)"
    );
}

/// A parent that is not a class is rejected.
#[test]
fn parent_must_be_class() {
    let mut session = Session::new();
    let base = session.define_class(ClassBuilder::new("Base")).unwrap();
    let instance = session.call(&base, ArgValues::Empty).unwrap();

    let err = session
        .define_class(ClassBuilder::new("Bad").parent(instance.ref_id().unwrap()))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: class 'Bad' cannot inherit from 'object' object"
    );
}
