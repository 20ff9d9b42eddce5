/// Method binding and call dispatch: bound methods, instantiation, `__call__`,
/// and propagation of errors raised by host functions.
use pretty_assertions::assert_eq;
use pyattr::{ArgValues, ClassBuilder, ExcType, Function, FunctionBody, Session, UserProperty, Value};

// =============================================================================
// Bound methods
// =============================================================================

/// `__self__` and `__func__` expose the two halves of a bound method.
#[test]
fn bound_method_exposes_receiver_and_function() {
    let mut session = Session::new();
    let f = session.define_function(Function::new("me", 1, FunctionBody::ReturnArg(0)));
    let class = session.define_class(ClassBuilder::new("A").method("me", f)).unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let bound = session.get_attr(&a, "me").unwrap();
    assert!(session.get_attr(&bound, "__self__").unwrap().is(&a));
    assert_eq!(session.get_attr(&bound, "__func__").unwrap(), Value::DefFunction(f));
    assert!(session.call(&bound, ArgValues::Empty).unwrap().is(&a));
}

/// Through the class the function stays unbound and takes the receiver explicitly.
#[test]
fn class_access_returns_unbound_function() {
    let mut session = Session::new();
    let f = session.define_function(Function::new("me", 1, FunctionBody::ReturnArg(0)));
    let class = session.define_class(ClassBuilder::new("A").method("me", f)).unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let unbound = session.get_attr(&class, "me").unwrap();
    assert_eq!(unbound, Value::DefFunction(f));
    assert!(session.call(&unbound, ArgValues::One(a.clone())).unwrap().is(&a));

    let err = session.call(&unbound, ArgValues::Empty).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: me() takes 1 positional argument but 0 were given"
    );
}

/// Explicit arguments follow the implicit receiver; arity is checked by the host.
#[test]
fn bound_method_arguments_and_arity() {
    let mut session = Session::new();
    let second = session.define_function(Function::new("second", 2, FunctionBody::ReturnArg(1)));
    let class = session.define_class(ClassBuilder::new("A").method("second", second)).unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let bound = session.get_attr(&a, "second").unwrap();
    assert_eq!(session.call(&bound, ArgValues::One(Value::Int(7))).unwrap(), Value::Int(7));

    let err = session
        .call(&bound, ArgValues::Two(Value::Int(1), Value::Int(2)))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: second() takes 2 positional arguments but 3 were given"
    );
}

/// Every instance fetch creates a fresh bound method.
#[test]
fn each_fetch_binds_anew() {
    let mut session = Session::new();
    let f = session.define_function(Function::new("f", 1, FunctionBody::Return(Value::None)));
    let class = session.define_class(ClassBuilder::new("A").method("f", f)).unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let first = session.get_attr(&a, "f").unwrap();
    let second = session.get_attr(&a, "f").unwrap();
    assert!(!first.is(&second));
    assert_eq!(session.stats().objects_by_type.get("BoundMethod"), Some(&2));
}

// =============================================================================
// Instantiation and __call__
// =============================================================================

/// `A(5)` runs `__init__(self, 5)`.
#[test]
fn instantiation_runs_init() {
    let mut session = Session::new();
    let init = session.define_function(Function::new(
        "__init__",
        2,
        FunctionBody::StoreAttr {
            arg: 0,
            attr: "x".to_owned(),
            value_arg: 1,
        },
    ));
    let class = session.define_class(ClassBuilder::new("A").method("__init__", init)).unwrap();

    let a = session.call(&class, ArgValues::One(Value::Int(5))).unwrap();
    assert_eq!(session.type_name(&a).unwrap(), "A");
    assert_eq!(session.get_attr(&a, "x").unwrap(), Value::Int(5));

    let err = session.call(&class, ArgValues::Empty).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: __init__() takes 2 positional arguments but 1 was given"
    );
}

/// An inherited `__init__` is found through the chain.
#[test]
fn inherited_init() {
    let mut session = Session::new();
    let init = session.define_function(Function::new(
        "__init__",
        2,
        FunctionBody::StoreAttr {
            arg: 0,
            attr: "x".to_owned(),
            value_arg: 1,
        },
    ));
    let base = session.define_class(ClassBuilder::new("Base").method("__init__", init)).unwrap();
    let derived = session
        .define_class(ClassBuilder::new("Derived").parent(base.ref_id().unwrap()))
        .unwrap();

    let d = session.call(&derived, ArgValues::One(Value::Int(1))).unwrap();
    assert_eq!(session.type_name(&d).unwrap(), "Derived");
    assert_eq!(session.instance_attr(&d, "x"), Some(Value::Int(1)));
}

#[test]
fn class_without_init_takes_no_arguments() {
    let mut session = Session::new();
    let class = session.define_class(ClassBuilder::new("A")).unwrap();
    let err = session.call(&class, ArgValues::One(Value::Int(1))).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: A() takes no arguments");
}

#[test]
fn init_must_return_none() {
    let mut session = Session::new();
    let init = session.define_function(Function::new("__init__", 1, FunctionBody::Return(Value::Int(1))));
    let class = session.define_class(ClassBuilder::new("A").method("__init__", init)).unwrap();
    let err = session.call(&class, ArgValues::Empty).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: __init__() should return None, not 'int'"
    );
}

/// Instances are callable when their class defines `__call__`.
#[test]
fn instance_call_dispatches_to_dunder_call() {
    let mut session = Session::new();
    let call = session.define_function(Function::new("__call__", 2, FunctionBody::ReturnArg(1)));
    let callable = session.define_class(ClassBuilder::new("Callable").method("__call__", call)).unwrap();
    let plain = session.define_class(ClassBuilder::new("Plain")).unwrap();

    let c = session.call(&callable, ArgValues::Empty).unwrap();
    assert_eq!(session.call(&c, ArgValues::One(Value::Int(3))).unwrap(), Value::Int(3));

    let p = session.call(&plain, ArgValues::Empty).unwrap();
    let err = session.call(&p, ArgValues::Empty).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'Plain' object is not callable");
}

/// `__call__` and `__init__` come from the class chain; instance storage never
/// makes an object callable or replaces its class's hook.
#[test]
fn special_methods_ignore_instance_storage() {
    let mut session = Session::new();
    let call = session.define_function(Function::new("__call__", 2, FunctionBody::ReturnArg(1)));
    let other = session.define_function(Function::new("other", 1, FunctionBody::Return(Value::Int(0))));
    let callable = session.define_class(ClassBuilder::new("Callable").method("__call__", call)).unwrap();
    let plain = session.define_class(ClassBuilder::new("Plain")).unwrap();

    let c = session.call(&callable, ArgValues::Empty).unwrap();
    session.set_instance_attr(&c, "__call__", other).unwrap();
    assert_eq!(session.call(&c, ArgValues::One(Value::Int(3))).unwrap(), Value::Int(3));

    let p = session.call(&plain, ArgValues::Empty).unwrap();
    session.set_instance_attr(&p, "__call__", other).unwrap();
    let err = session.call(&p, ArgValues::Empty).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'Plain' object is not callable");
}

/// Properties and other builtin wrappers are not callable.
#[test]
fn property_object_is_not_callable() {
    let mut session = Session::new();
    let getter = session.define_function(Function::new("x", 1, FunctionBody::Return(Value::None)));
    let prop = session.new_property(UserProperty::new(getter)).unwrap();
    let err = session.call(&prop, ArgValues::Empty).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'property' object is not callable");
}

// =============================================================================
// Host errors
// =============================================================================

/// An exception raised by a getter propagates unchanged, with no failure kind.
#[test]
fn getter_exception_propagates() {
    let mut session = Session::new();
    let getter = session.define_function(Function::new(
        "x",
        1,
        FunctionBody::Raise {
            exc_type: ExcType::ValueError,
            message: Some("boom".to_owned()),
        },
    ));
    let class = session
        .define_class(ClassBuilder::new("A").property("x", UserProperty::new(getter)))
        .unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let err = session.get_attr(&a, "x").unwrap_err();
    assert!(err.is_exception_type(ExcType::ValueError));
    assert_eq!(err.to_string(), "ValueError: boom");
    assert_eq!(err.failure(), None);
}

/// A setter that raises leaves instance storage untouched.
#[test]
fn setter_exception_propagates() {
    let mut session = Session::new();
    let getter = session.define_function(Function::new("x", 1, FunctionBody::Return(Value::None)));
    let setter = session.define_function(Function::new(
        "x",
        2,
        FunctionBody::Raise {
            exc_type: ExcType::TypeError,
            message: None,
        },
    ));
    let class = session
        .define_class(ClassBuilder::new("A").property("x", UserProperty::new(getter).with_setter(setter)))
        .unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    let err = session.set_attr(&a, "x", 1).unwrap_err();
    assert_eq!(err.to_string(), "TypeError");
    assert_eq!(session.instance_attr(&a, "x"), None);
}
